//! Exposes a whole [`FileSystem`] as a single [`Provider`], so that one
//! file system's contents can be mounted as a subtree of another (used by
//! the session layer to overlay a game's VFS inside the engine's).

use std::sync::Arc;

use crate::error::Error;
use crate::fs::FileSystem;
use crate::handle::{File, OpenMode};
use crate::path::{VPath, VPathBuf};
use crate::provider::Provider;

/// Wraps an existing [`FileSystem`] so it can be mounted as a provider
/// inside another one. Paths crossing the boundary are relative to the
/// wrapped file system's root, exactly as they would be for any other
/// provider mounted at that point.
pub struct FileSystemOverlay {
	inner: Arc<FileSystem>,
}

impl FileSystemOverlay {
	#[must_use]
	pub fn new(inner: Arc<FileSystem>) -> Self {
		Self { inner }
	}
}

impl Provider for FileSystemOverlay {
	fn list(&self) -> Vec<VPathBuf> {
		self.inner
			.list(None)
			.map(|set| set.into_iter().collect())
			.unwrap_or_default()
	}

	fn has(&self, path: &VPath) -> bool {
		self.inner.exists(path)
	}

	fn isfile(&self, path: &VPath) -> bool {
		self.inner.isfile(path)
	}

	fn isdir(&self, path: &VPath) -> bool {
		self.inner.isdir(path)
	}

	fn open(&self, path: &VPath, mode: OpenMode) -> Result<Box<dyn File>, Error> {
		let guard = self.inner.open(path, mode)?;
		Ok(Box::new(OverlayFile {
			path: path.to_owned(),
			guard: Some(guard),
		}))
	}
}

/// Wraps an [`crate::handle::OpenFile`] from the inner file system as a
/// [`File`] so it can be returned across the overlay boundary without
/// leaking the inner guard type.
struct OverlayFile {
	path: VPathBuf,
	guard: Option<crate::handle::OpenFile>,
}

impl OverlayFile {
	fn guard(&self) -> Result<&crate::handle::OpenFile, Error> {
		self.guard.as_ref().ok_or_else(|| Error::Closed(self.path.clone()))
	}

	fn guard_mut(&mut self) -> Result<&mut crate::handle::OpenFile, Error> {
		self.guard.as_mut().ok_or_else(|| Error::Closed(self.path.clone()))
	}
}

impl File for OverlayFile {
	fn opened(&self) -> bool {
		self.guard.as_ref().is_some_and(|g| g.get().opened())
	}

	fn readable(&self) -> bool {
		self.guard.as_ref().is_some_and(|g| g.get().readable())
	}

	fn writable(&self) -> bool {
		self.guard.as_ref().is_some_and(|g| g.get().writable())
	}

	fn seekable(&self) -> bool {
		self.guard.as_ref().is_some_and(|g| g.get().seekable())
	}

	fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error> {
		self.guard_mut()?.read(amount)
	}

	fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
		self.guard_mut()?.write(data)
	}

	fn seek(&mut self, offset: i64, whence: crate::handle::Whence) -> Result<u64, Error> {
		self.guard_mut()?.seek(offset, whence)
	}

	fn tell(&self) -> Result<u64, Error> {
		self.guard()?.tell()
	}

	fn close(&mut self) {
		if let Some(mut guard) = self.guard.take() {
			guard.close();
		}
	}

	fn path(&self) -> &VPathBuf {
		&self.path
	}
}
