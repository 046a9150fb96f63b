//! Resolves and loads modules by dotted name from a session's virtual file
//! system, through an explicit `Compiler` seam rather than any meta-path
//! machinery, since Rust has nothing to hook into a host import system.

pub mod compiler;
pub mod error;
pub mod header;
pub mod importer;
pub mod source;

pub use compiler::Compiler;
pub use error::ImportError;
pub use importer::{Importer, LoadedModule, ResolvedModule};
