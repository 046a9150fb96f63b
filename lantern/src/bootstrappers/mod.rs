//! Bootstrapper API: pluggable engine/game startup backends, one module per
//! bootstrapping strategy, selected by name from the CLI.

pub mod filesystem;

use std::sync::Arc;

use lantern_vfs::FileSystem;

use crate::error::BootstrapError;

/// Bootstraps the engine's and a game's file systems. Implementations are
/// looked up by name (`-b`/`-B` on the CLI); `"filesystem"` is the only one
/// this binary ships, mounting real OS directories.
pub trait Bootstrapper: Send + Sync {
	/// Mounts the well-known engine roots (`/.lantern`, `/.modules`,
	/// `/.common`) on `fs`.
	fn bootstrap_engine_filesystem(&self, fs: &FileSystem) -> Result<(), BootstrapError>;

	/// Mounts a game's own root (`/`) and module directory (`/.modules`) on
	/// `fs`, with `engine_fs` available as a fallback overlay.
	fn bootstrap_game_filesystem(&self, fs: &FileSystem, engine_fs: Arc<FileSystem>, base: &str) -> Result<(), BootstrapError>;
}

/// Looks up a bootstrapper by name, defaulting to `"filesystem"` when none
/// is given, since it's the only bootstrapper this binary ships.
pub fn find(name: Option<&str>) -> Result<Box<dyn Bootstrapper>, BootstrapError> {
	match name.unwrap_or("filesystem") {
		"filesystem" => Ok(Box::new(filesystem::FilesystemBootstrapper::new())),
		other => Err(BootstrapError::UnknownBootstrapper(other.to_owned())),
	}
}
