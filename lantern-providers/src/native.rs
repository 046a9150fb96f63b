//! Mounts a real OS directory as a provider.

use std::cell::Cell;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use lantern_vfs::{Error, File, OpenMode, Provider, VPath, VPathBuf, Whence};

/// A provider backed by a directory on the host file system. Paths are
/// translated to native ones relative to `root`.
pub struct NativeProvider {
	root: PathBuf,
	writable: bool,
}

impl NativeProvider {
	#[must_use]
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			writable: false,
		}
	}

	#[must_use]
	pub fn writable(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			writable: true,
		}
	}

	fn native_path(&self, path: &VPath) -> PathBuf {
		let mut native = self.root.clone();
		for segment in lantern_vfs::path::split(path.as_str()) {
			native.push(segment);
		}
		native
	}
}

impl Provider for NativeProvider {
	fn list(&self) -> Vec<VPathBuf> {
		let mut out = Vec::new();
		let mut stack = vec![self.root.clone()];

		while let Some(dir) = stack.pop() {
			let Ok(entries) = fs::read_dir(&dir) else {
				continue;
			};

			for entry in entries.flatten() {
				let path = entry.path();
				let Ok(relative) = path.strip_prefix(&self.root) else {
					continue;
				};
				let Some(relative) = relative.to_str() else {
					continue;
				};

				if path.is_dir() {
					stack.push(path.clone());
				} else {
					out.push(VPathBuf::from(format!("/{relative}").replace('\\', "/").as_str()));
				}
			}
		}

		out
	}

	fn isfile(&self, path: &VPath) -> bool {
		self.native_path(path).is_file()
	}

	fn isdir(&self, path: &VPath) -> bool {
		self.native_path(path).is_dir()
	}

	fn open(&self, path: &VPath, mode: OpenMode) -> Result<Box<dyn File>, Error> {
		let native = self.native_path(path);

		let mut options = OpenOptions::new();
		match mode {
			OpenMode::Read => {
				options.read(true);
			}
			OpenMode::Write => {
				if !self.writable {
					return Err(Error::NotWritable(path.to_owned()));
				}
				options.write(true).create(true).truncate(true);
			}
			OpenMode::ReadWrite => {
				if !self.writable {
					return Err(Error::NotWritable(path.to_owned()));
				}
				options.read(true).write(true).create(true);
			}
		}

		let handle = options
			.open(&native)
			.map_err(|e| Error::from_native(path.to_owned(), e))?;

		Ok(Box::new(NativeFile {
			path: path.to_owned(),
			handle: Some(handle),
			writable: matches!(mode, OpenMode::Write | OpenMode::ReadWrite),
			pos: Cell::new(0),
		}))
	}
}

struct NativeFile {
	path: VPathBuf,
	handle: Option<std::fs::File>,
	writable: bool,
	pos: Cell<u64>,
}

impl File for NativeFile {
	fn opened(&self) -> bool {
		self.handle.is_some()
	}

	fn readable(&self) -> bool {
		self.handle.is_some()
	}

	fn writable(&self) -> bool {
		self.handle.is_some() && self.writable
	}

	fn seekable(&self) -> bool {
		self.handle.is_some()
	}

	fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error> {
		let handle = self.handle.as_mut().ok_or_else(|| Error::Closed(self.path.clone()))?;

		let mut buf = Vec::new();
		match amount {
			Some(n) => {
				buf.resize(n, 0);
				let read = handle
					.read(&mut buf)
					.map_err(|e| Error::from_native(self.path.clone(), e))?;
				buf.truncate(read);
			}
			None => {
				handle
					.read_to_end(&mut buf)
					.map_err(|e| Error::from_native(self.path.clone(), e))?;
			}
		}

		self.pos.set(
			handle
				.stream_position()
				.map_err(|e| Error::from_native(self.path.clone(), e))?,
		);
		Ok(buf)
	}

	fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
		if !self.writable {
			return Err(Error::NotWritable(self.path.clone()));
		}

		let handle = self.handle.as_mut().ok_or_else(|| Error::Closed(self.path.clone()))?;
		let written = handle
			.write(data)
			.map_err(|e| Error::from_native(self.path.clone(), e))?;
		self.pos.set(
			handle
				.stream_position()
				.map_err(|e| Error::from_native(self.path.clone(), e))?,
		);
		Ok(written)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
		let handle = self.handle.as_mut().ok_or_else(|| Error::Closed(self.path.clone()))?;
		let pos = match whence {
			Whence::Set => SeekFrom::Start(offset as u64),
			Whence::Cur => SeekFrom::Current(offset),
			Whence::End => SeekFrom::End(offset),
		};
		let new_pos = handle.seek(pos).map_err(|e| Error::from_native(self.path.clone(), e))?;
		self.pos.set(new_pos);
		Ok(new_pos)
	}

	fn tell(&self) -> Result<u64, Error> {
		if self.handle.is_none() {
			return Err(Error::Closed(self.path.clone()));
		}
		Ok(self.pos.get())
	}

	fn close(&mut self) {
		self.handle.take();
	}

	fn path(&self) -> &VPathBuf {
		&self.path
	}
}
