//! An in-memory provider, useful for tests and for synthesizing files at
//! runtime (compiled module bytecode, scratch buffers) without touching disk.

use std::collections::HashMap;
use std::sync::Arc;

use lantern_vfs::{Error, File, OpenMode, Provider, VPath, VPathBuf, Whence};
use parking_lot::RwLock;

/// A provider whose contents live entirely in memory. Cheap to clone: the
/// backing map is shared behind an `Arc`.
#[derive(Clone, Default)]
pub struct MemoryProvider {
	files: Arc<RwLock<HashMap<VPathBuf, Vec<u8>>>>,
}

impl MemoryProvider {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, path: &VPath, data: impl Into<Vec<u8>>) {
		self.files.write().insert(path.to_owned(), data.into());
	}

	pub fn remove(&self, path: &VPath) -> Option<Vec<u8>> {
		self.files.write().remove(path)
	}
}

impl Provider for MemoryProvider {
	fn list(&self) -> Vec<VPathBuf> {
		self.files.read().keys().cloned().collect()
	}

	fn isfile(&self, path: &VPath) -> bool {
		self.files.read().contains_key(path)
	}

	fn isdir(&self, path: &VPath) -> bool {
		path.is_root() || self.files.read().keys().any(|f| f.is_child_of(path))
	}

	fn open(&self, path: &VPath, mode: OpenMode) -> Result<Box<dyn File>, Error> {
		let data = match mode {
			OpenMode::Read => self
				.files
				.read()
				.get(path)
				.cloned()
				.ok_or_else(|| Error::NotFound(path.to_owned()))?,
			OpenMode::Write | OpenMode::ReadWrite => {
				self.files.write().entry(path.to_owned()).or_default().clone()
			}
		};

		Ok(Box::new(MemoryFile {
			path: path.to_owned(),
			backing: self.files.clone(),
			data,
			pos: 0,
			writable: matches!(mode, OpenMode::Write | OpenMode::ReadWrite),
			open: true,
		}))
	}
}

struct MemoryFile {
	path: VPathBuf,
	backing: Arc<RwLock<HashMap<VPathBuf, Vec<u8>>>>,
	data: Vec<u8>,
	pos: usize,
	writable: bool,
	open: bool,
}

impl File for MemoryFile {
	fn opened(&self) -> bool {
		self.open
	}

	fn readable(&self) -> bool {
		self.open
	}

	fn writable(&self) -> bool {
		self.open && self.writable
	}

	fn seekable(&self) -> bool {
		self.open
	}

	fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error> {
		if !self.open {
			return Err(Error::Closed(self.path.clone()));
		}

		let end = match amount {
			Some(n) => (self.pos + n).min(self.data.len()),
			None => self.data.len(),
		};
		let out = self.data[self.pos..end].to_vec();
		self.pos = end;
		Ok(out)
	}

	fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
		if !self.open {
			return Err(Error::Closed(self.path.clone()));
		}
		if !self.writable {
			return Err(Error::NotWritable(self.path.clone()));
		}

		let end = self.pos + data.len();
		if end > self.data.len() {
			self.data.resize(end, 0);
		}
		self.data[self.pos..end].copy_from_slice(data);
		self.pos = end;
		self.backing.write().insert(self.path.clone(), self.data.clone());
		Ok(data.len())
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
		if !self.open {
			return Err(Error::Closed(self.path.clone()));
		}

		let base = match whence {
			Whence::Set => 0,
			Whence::Cur => self.pos as i64,
			Whence::End => self.data.len() as i64,
		};
		let new_pos = base + offset;
		if new_pos < 0 {
			return Err(Error::NotSeekable(self.path.clone()));
		}
		self.pos = new_pos as usize;
		Ok(self.pos as u64)
	}

	fn tell(&self) -> Result<u64, Error> {
		if !self.open {
			return Err(Error::Closed(self.path.clone()));
		}
		Ok(self.pos as u64)
	}

	fn close(&mut self) {
		self.open = false;
	}

	fn path(&self) -> &VPathBuf {
		&self.path
	}
}
