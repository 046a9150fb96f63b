//! The virtual file system's error taxonomy.
//!
//! Every variant carries the offending path, per the policy in the project's
//! error handling design: callers should never need to re-derive which path
//! an error is about from surrounding context.

use std::io;

use crate::path::VPathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("not found: {0}")]
	NotFound(VPathBuf),
	#[error("access denied: {0}")]
	AccessDenied(VPathBuf),
	#[error("not readable: {0}")]
	NotReadable(VPathBuf),
	#[error("not writable: {0}")]
	NotWritable(VPathBuf),
	#[error("not seekable: {0}")]
	NotSeekable(VPathBuf),
	#[error("closed: {0}")]
	Closed(VPathBuf),
	#[error("not a file: {0}")]
	NotAFile(VPathBuf),
	#[error("not a directory: {0}")]
	NotADirectory(VPathBuf),
	#[error("key not found: {0}")]
	KeyNotFound(VPathBuf),
	#[error("native I/O error at {path}: {source}")]
	Native {
		path: VPathBuf,
		#[source]
		source: io::Error,
	},
}

impl Error {
	#[must_use]
	pub fn path(&self) -> Option<&VPathBuf> {
		match self {
			Error::NotFound(p)
			| Error::AccessDenied(p)
			| Error::NotReadable(p)
			| Error::NotWritable(p)
			| Error::NotSeekable(p)
			| Error::Closed(p)
			| Error::NotAFile(p)
			| Error::NotADirectory(p)
			| Error::KeyNotFound(p) => Some(p),
			Error::Native { path, .. } => Some(path),
		}
	}

	#[must_use]
	pub fn is_not_found(&self) -> bool {
		matches!(self, Error::NotFound(_))
	}

	/// Maps a native OS error observed while servicing `path` to this
	/// taxonomy. `std::io::ErrorKind` doesn't expose every POSIX errno
	/// distinctly on stable Rust, so this inspects the raw OS error on
	/// Unix-like targets for the handful of cases that need it, falling back
	/// to [`Error::Native`] otherwise.
	#[must_use]
	pub fn from_native(path: VPathBuf, source: io::Error) -> Self {
		match source.kind() {
			io::ErrorKind::NotFound => Error::NotFound(path),
			io::ErrorKind::PermissionDenied => Error::AccessDenied(path),
			_ => {
				#[cfg(unix)]
				if let Some(code) = source.raw_os_error() {
					match code {
						libc::ENOTDIR => return Error::NotADirectory(path),
						libc::EISDIR => return Error::NotAFile(path),
						libc::EROFS => return Error::NotWritable(path),
						libc::EBUSY => return Error::AccessDenied(path),
						_ => {}
					}
				}

				Error::Native { path, source }
			}
		}
	}
}
