//! The polymorphic file handle abstraction.

use crate::error::Error;
use crate::path::VPathBuf;

/// Seek origin, mirrored from `io::SeekFrom` but kept local so providers
/// don't need to depend on the specific `std::io` seek semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
	Set,
	Cur,
	End,
}

/// The mode an `open` call is requesting. Most reference providers only ever
/// honor `Read`; providers backed by a genuinely writable store may also
/// honor `Write`/`ReadWrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
	#[default]
	Read,
	Write,
	ReadWrite,
}

/// Contract for an open file. Every concrete implementation is responsible
/// for closing itself exactly once on `Drop`, so that scoped acquisition
/// (holding an [`OpenFile`]) guarantees a close on every exit path, including
/// panics unwinding through the guard's scope.
pub trait File: Send {
	/// Idempotent; `false` after a successful `close`.
	fn opened(&self) -> bool;
	fn readable(&self) -> bool {
		false
	}
	fn writable(&self) -> bool {
		false
	}
	fn seekable(&self) -> bool {
		false
	}

	/// Reads up to `amount` bytes, or all remaining bytes if `amount` is
	/// `None`.
	fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error>;
	fn write(&mut self, data: &[u8]) -> Result<usize, Error>;
	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error>;
	fn tell(&self) -> Result<u64, Error>;

	/// Closes this handle. Closing an already-closed handle is a silent
	/// no-op; implementations must guard against double-close themselves.
	fn close(&mut self);

	/// The canonical path this handle was opened against, for error
	/// reporting from the default trait method bodies below.
	fn path(&self) -> &VPathBuf;
}

/// Default-implementation helpers matching the capability-gated error
/// policy in the component design: an operation unsupported by the
/// underlying handle fails with the matching typed error rather than
/// panicking or silently no-op-ing.
pub fn guard_read(file: &dyn File) -> Result<(), Error> {
	if !file.opened() {
		return Err(Error::Closed(file.path().clone()));
	}
	if !file.readable() {
		return Err(Error::NotReadable(file.path().clone()));
	}
	Ok(())
}

pub fn guard_write(file: &dyn File) -> Result<(), Error> {
	if !file.opened() {
		return Err(Error::Closed(file.path().clone()));
	}
	if !file.writable() {
		return Err(Error::NotWritable(file.path().clone()));
	}
	Ok(())
}

pub fn guard_seek(file: &dyn File) -> Result<(), Error> {
	if !file.opened() {
		return Err(Error::Closed(file.path().clone()));
	}
	if !file.seekable() {
		return Err(Error::NotSeekable(file.path().clone()));
	}
	Ok(())
}

/// An RAII handle around a boxed [`File`]. Entering its scope (holding the
/// value) yields the handle; leaving it on any path closes the file exactly
/// once. This is the scoped-acquisition form required by the resource
/// discipline: callers should prefer this over manually calling `close`.
pub struct OpenFile {
	inner: Box<dyn File>,
}

impl OpenFile {
	#[must_use]
	pub fn new(inner: Box<dyn File>) -> Self {
		Self { inner }
	}

	#[must_use]
	pub fn get(&self) -> &dyn File {
		self.inner.as_ref()
	}

	#[must_use]
	pub fn get_mut(&mut self) -> &mut dyn File {
		self.inner.as_mut()
	}

	pub fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error> {
		self.inner.read(amount)
	}

	pub fn read_to_end(&mut self) -> Result<Vec<u8>, Error> {
		self.inner.read(None)
	}

	pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
		self.inner.write(data)
	}

	pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
		self.inner.seek(offset, whence)
	}

	pub fn tell(&self) -> Result<u64, Error> {
		self.inner.tell()
	}

	/// Closes the handle early. Subsequent drop is then a no-op, relying on
	/// the inner implementation's own idempotent `close`.
	pub fn close(&mut self) {
		self.inner.close();
	}
}

impl Drop for OpenFile {
	fn drop(&mut self) {
		if self.inner.opened() {
			self.inner.close();
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	struct Scratch {
		path: VPathBuf,
		data: Vec<u8>,
		pos: usize,
		open: bool,
		closes: std::rc::Rc<std::cell::Cell<u32>>,
	}

	impl File for Scratch {
		fn opened(&self) -> bool {
			self.open
		}

		fn readable(&self) -> bool {
			self.open
		}

		fn seekable(&self) -> bool {
			self.open
		}

		fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error> {
			guard_read(self)?;
			let end = match amount {
				Some(n) => (self.pos + n).min(self.data.len()),
				None => self.data.len(),
			};
			let slice = self.data[self.pos..end].to_vec();
			self.pos = end;
			Ok(slice)
		}

		fn write(&mut self, _data: &[u8]) -> Result<usize, Error> {
			guard_write(self)?;
			unreachable!("test double is read-only")
		}

		fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
			guard_seek(self)?;
			self.pos = match whence {
				Whence::Set => offset as usize,
				Whence::Cur => (self.pos as i64 + offset) as usize,
				Whence::End => (self.data.len() as i64 + offset) as usize,
			};
			Ok(self.pos as u64)
		}

		fn tell(&self) -> Result<u64, Error> {
			guard_seek(self)?;
			Ok(self.pos as u64)
		}

		fn close(&mut self) {
			if self.open {
				self.open = false;
				self.closes.set(self.closes.get() + 1);
			}
		}

		fn path(&self) -> &VPathBuf {
			&self.path
		}
	}

	#[test]
	fn closes_exactly_once_on_drop() {
		let closes = std::rc::Rc::new(std::cell::Cell::new(0));
		{
			let scratch = Scratch {
				path: VPathBuf::from("/a.txt"),
				data: b"hello".to_vec(),
				pos: 0,
				open: true,
				closes: closes.clone(),
			};
			let mut guard = OpenFile::new(Box::new(scratch));
			assert_eq!(guard.read(Some(5)).unwrap(), b"hello");
		}
		assert_eq!(closes.get(), 1);
	}

	#[test]
	fn explicit_close_then_drop_is_noop() {
		let closes = std::rc::Rc::new(std::cell::Cell::new(0));
		let scratch = Scratch {
			path: VPathBuf::from("/a.txt"),
			data: b"hello".to_vec(),
			pos: 0,
			open: true,
			closes: closes.clone(),
		};
		let mut guard = OpenFile::new(Box::new(scratch));
		guard.close();
		drop(guard);
		assert_eq!(closes.get(), 1);
	}

	#[test]
	fn read_on_closed_handle_fails() {
		let closes = std::rc::Rc::new(std::cell::Cell::new(0));
		let mut scratch = Scratch {
			path: VPathBuf::from("/a.txt"),
			data: b"hello".to_vec(),
			pos: 0,
			open: false,
			closes,
		};
		assert!(matches!(scratch.read(None), Err(Error::Closed(_))));
	}
}
