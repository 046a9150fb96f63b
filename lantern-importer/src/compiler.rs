//! The seam between the importer and whatever scripting language a given
//! embedding actually runs. The importer itself never interprets source or
//! bytecode; it only locates, reads, and decodes it.

use lantern_vfs::VPath;

use crate::error::ImportError;
use crate::header::MAGIC_LEN;

/// Turns decoded source or bytecode into a loaded unit of type `Output`.
/// An embedding provides one implementation per scripting language it
/// supports; the importer is otherwise completely language-agnostic.
pub trait Compiler: Send + Sync {
	type Output;

	fn compile_source(&self, path: &VPath, source: &str) -> Result<Self::Output, ImportError>;

	/// Bytes expected at the start of every compiled module this compiler
	/// accepts. The importer checks this before stripping the header and
	/// handing the payload to [`Compiler::compile_bytecode`].
	fn magic(&self) -> [u8; MAGIC_LEN];

	/// Compiles an already header-stripped bytecode payload.
	fn compile_bytecode(&self, path: &VPath, payload: &[u8]) -> Result<Self::Output, ImportError>;
}
