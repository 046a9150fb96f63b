//! The Provider and Transformer capability interfaces.
//!
//! These are kept as distinct traits even though every [`Transformer`] is
//! usable as a [`Provider`] (`Transformer: Provider`), because a transformer
//! carries an extra lifecycle (construction from an already-open handle)
//! that an ordinary provider does not.

use crate::error::Error;
use crate::handle::{File, OpenMode};
use crate::path::{VPath, VPathBuf};

/// A mounted source of files and directories. A provider is always mounted
/// at some canonical mount point and only ever sees paths relative to it.
pub trait Provider: Send + Sync {
	/// Every path this provider exposes, relative to its own mount point.
	/// Both files and directories may appear; directories need not be
	/// listed explicitly if every file under them is.
	fn list(&self) -> Vec<VPathBuf>;

	fn has(&self, path: &VPath) -> bool {
		self.isfile(path) || self.isdir(path)
	}

	fn isfile(&self, path: &VPath) -> bool;
	fn isdir(&self, path: &VPath) -> bool;

	/// Opens `path`, relative to this provider's mount point.
	fn open(&self, path: &VPath, mode: OpenMode) -> Result<Box<dyn File>, Error>;
}

/// A type that can attempt to construct a [`Transformer`] from a source file
/// already identified (by path) and already open (as a handle). Returning
/// `Err` or a transformer whose [`Transformer::valid`] is `false` is treated
/// by the file system as "this factory doesn't apply here" rather than as a
/// hard failure, see the file system's cache-building rules.
pub trait TransformerFactory: Send + Sync {
	/// `path` is the canonical path of the source file in the containing
	/// `FileSystem`; `handle` is an already-opened readable handle for it.
	/// Implementations must not retain `handle` past this call unless they
	/// take ownership of it; the `FileSystem` will not reopen the source
	/// for them afterwards.
	fn try_create(&self, path: &VPath, handle: Box<dyn File>) -> Result<Box<dyn Transformer>, Error>;
}

/// A provider that is itself produced, lazily, from an existing file.
pub trait Transformer: Provider {
	/// Whether the source this transformer was constructed from is actually
	/// of the format this transformer handles. Checked once, right after
	/// construction; a `false` here is swallowed by the caller exactly like
	/// a construction error would be.
	fn valid(&self) -> bool;

	/// Whether the original source path should be evicted from the file
	/// system's cache once this transformer is mounted.
	fn consumes(&self) -> bool;

	/// Whether the files this transformer exposes should be mounted
	/// relative to `dirname(source path)` (`true`) or at `/` (`false`).
	fn relative(&self) -> bool;
}
