//! Mounts real OS directories for the engine and a game.

use std::path::PathBuf;
use std::sync::Arc;

use lantern_providers::NativeProvider;
use lantern_vfs::{FileSystem, FileSystemOverlay, VPath};

use crate::bootstrap::{COMMON_MOUNT, ENGINE_MOUNT, GAME_MOUNT, MODULE_MOUNT};
use crate::bootstrappers::Bootstrapper;
use crate::error::BootstrapError;

/// Where the engine looks for its own source tree, modules, and shared
/// data when no other configuration is given: an `engine`/`modules`/
/// `common` layout under `$LANTERN_HOME`, falling back to the current
/// working directory. Rust has no notion of "my own source directory" at
/// runtime the way a dynamically loaded module can introspect its own file
/// path, so this is configured via environment instead.
fn engine_home() -> PathBuf {
	std::env::var_os("LANTERN_HOME")
		.map(PathBuf::from)
		.or_else(|| std::env::current_dir().ok())
		.unwrap_or_else(|| PathBuf::from("."))
}

pub struct FilesystemBootstrapper {
	home: PathBuf,
}

impl FilesystemBootstrapper {
	#[must_use]
	pub fn new() -> Self {
		Self { home: engine_home() }
	}
}

impl Default for FilesystemBootstrapper {
	fn default() -> Self {
		Self::new()
	}
}

impl Bootstrapper for FilesystemBootstrapper {
	fn bootstrap_engine_filesystem(&self, fs: &FileSystem) -> Result<(), BootstrapError> {
		fs.clear();
		fs.mount(VPath::new(ENGINE_MOUNT), Arc::new(NativeProvider::new(self.home.join("engine"))));
		fs.mount(VPath::new(MODULE_MOUNT), Arc::new(NativeProvider::new(self.home.join("modules"))));
		fs.mount(VPath::new(COMMON_MOUNT), Arc::new(NativeProvider::new(self.home.join("common"))));
		Ok(())
	}

	fn bootstrap_game_filesystem(&self, fs: &FileSystem, engine_fs: Arc<FileSystem>, base: &str) -> Result<(), BootstrapError> {
		fs.clear();
		// Lowest precedence: anything the game doesn't provide falls
		// through to the engine session's own file system.
		fs.mount(VPath::new(GAME_MOUNT), Arc::new(FileSystemOverlay::new(engine_fs)));

		let base_dir = PathBuf::from(base);
		fs.mount(VPath::new(MODULE_MOUNT), Arc::new(NativeProvider::new(base_dir.join("modules"))));
		fs.mount(VPath::new(GAME_MOUNT), Arc::new(NativeProvider::new(base_dir.join("game"))));
		Ok(())
	}
}
