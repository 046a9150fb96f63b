//! Errors raised while resolving or loading a module.

use lantern_vfs::VPathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
	#[error("no module named {0:?}")]
	NotFound(String),
	#[error("{0:?} is not registered as a package root")]
	UnknownRoot(String),
	#[error("bad compiled-module magic at {0}")]
	BadMagic(VPathBuf),
	#[error("compiled module at {0} is truncated")]
	Truncated(VPathBuf),
	#[error("source at {0} is not valid text")]
	BadEncoding(VPathBuf),
	#[error("file system error while loading {path}: {source}")]
	FileSystem {
		path: VPathBuf,
		#[source]
		source: lantern_vfs::Error,
	},
	#[error("compiler rejected {path}: {message}")]
	Compile { path: VPathBuf, message: String },
}
