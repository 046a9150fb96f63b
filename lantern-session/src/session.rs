//! A session: one self-contained `(FileSystem, EventBus, ExecutionEnvironment)`
//! triple. The engine owns exactly one; each running game owns its own.

use std::sync::Arc;

use lantern_vfs::FileSystem;

use crate::env::ExecutionEnvironment;
use crate::events::EventBus;

/// A named session. The engine process has exactly one "engine session";
/// each game run creates its own, layered in front of it via the Session
/// Registry (see [`crate::registry`]).
///
/// `fs` is `Arc`-wrapped so a game session can mount the engine session's
/// file system as a nested provider via `lantern_vfs::overlay::FileSystemOverlay`
/// without cloning it.
pub struct Session {
	pub name: String,
	pub base: Option<String>,
	pub fs: Arc<FileSystem>,
	pub events: EventBus,
	pub env: ExecutionEnvironment,
}

impl Session {
	#[must_use]
	pub fn new(name: impl Into<String>, base: Option<String>) -> Self {
		Self {
			name: name.into(),
			base,
			fs: Arc::new(FileSystem::new()),
			events: EventBus::new(),
			env: ExecutionEnvironment::new(),
		}
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session").field("name", &self.name).field("base", &self.base).finish()
	}
}
