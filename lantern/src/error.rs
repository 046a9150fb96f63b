//! Bootstrap-time errors. Kept as a plain `thiserror` enum rather than
//! `anyhow`, matching `server/src/main.rs`'s `Box<dyn Error>` plus manual
//! `.source()` chain walking.

use lantern_vfs::VPathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error("unknown bootstrapper: {0}")]
	UnknownBootstrapper(String),
	#[error("no game base given")]
	NoGameBase,
	#[error("could not read game base {path:?}")]
	Io {
		path: std::path::PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("file system error at {path}")]
	FileSystem {
		path: VPathBuf,
		#[source]
		source: lantern_vfs::Error,
	},
	#[error("could not import module {name}")]
	Import {
		name: String,
		#[source]
		source: lantern_importer::ImportError,
	},
}

/// Prints `err` and every `source()` beneath it, one per line, the way
/// `server/src/main.rs` reports a fatal startup error.
pub fn print_chain(err: &dyn std::error::Error) {
	eprintln!("error: {err}");
	let mut cause = err.source();
	while let Some(source) = cause {
		eprintln!("  caused by: {source}");
		cause = source.source();
	}
}
