//! A tiny manifest format read from each engine module's source.
//!
//! This bootstrap binary has no scripting VM of its own (a scripting
//! front end is out of scope here), so a module only ever declares its
//! metadata; its body is carried through unexecuted. Header lines, read
//! until the first blank line, declare the same things a loaded module
//! object would expose as attributes (priority, provisions, requirements):
//!
//! ```text
//! @priority -10
//! @provides db
//! @requires config
//! ```
//!
//! `@fail` is a test-only escape hatch: it makes the module's `load` hook
//! return an error, so the Modularity Engine's backtracking can be
//! exercised against real manifest files instead of only mock hooks.

use std::collections::HashMap;

use lantern_importer::header;
use lantern_importer::{Compiler, ImportError};
use lantern_modularity::{ModuleHooks, ModuleRecord, PRIORITY_NEUTRAL};
use lantern_vfs::VPath;

pub struct CompiledModule {
	pub priority: i32,
	pub provides: Vec<String>,
	pub requires: Vec<String>,
	pub fails: bool,
	pub body: String,
}

impl CompiledModule {
	/// Splits the compiled output into the record the Modularity Engine
	/// indexes and the hooks it calls back into at load/unload time.
	pub fn into_parts(self, name: impl Into<String>) -> (ModuleRecord, LoggingHooks) {
		let record = ModuleRecord::new(name).priority(self.priority).provides(self.provides).requires(self.requires);
		(record, LoggingHooks { body: self.body, fails: self.fails })
	}
}

pub struct ManifestCompiler;

/// Magic bytes a manifest compiler would stamp on any bytecode it produced,
/// were it ever extended to do so.
const MAGIC: [u8; header::MAGIC_LEN] = *b"LTMF";

impl Compiler for ManifestCompiler {
	type Output = CompiledModule;

	fn compile_source(&self, _path: &VPath, source: &str) -> Result<Self::Output, ImportError> {
		let mut priority = PRIORITY_NEUTRAL;
		let mut provides = Vec::new();
		let mut requires = Vec::new();
		let mut fails = false;
		let mut lines = source.lines();

		for line in lines.by_ref() {
			let line = line.trim();
			if line.is_empty() {
				break;
			}

			let Some(rest) = line.strip_prefix('@') else { continue };
			let mut parts = rest.splitn(2, char::is_whitespace);

			match (parts.next(), parts.next().map(str::trim)) {
				(Some("priority"), Some(value)) => priority = value.parse().unwrap_or(PRIORITY_NEUTRAL),
				(Some("provides"), Some(tag)) => provides.push(tag.to_owned()),
				(Some("requires"), Some(tag)) => requires.push(tag.to_owned()),
				(Some("fail"), _) => fails = true,
				_ => {}
			}
		}

		let body: String = lines.collect::<Vec<_>>().join("\n");
		Ok(CompiledModule { priority, provides, requires, fails, body })
	}

	fn magic(&self) -> [u8; header::MAGIC_LEN] {
		MAGIC
	}

	fn compile_bytecode(&self, path: &VPath, _payload: &[u8]) -> Result<Self::Output, ImportError> {
		Err(ImportError::Compile {
			path: path.to_owned(),
			message: "bytecode modules are not supported by the manifest compiler".to_owned(),
		})
	}
}

/// Logs a module's body at `trace` instead of executing it.
pub struct LoggingHooks {
	body: String,
	fails: bool,
}

impl ModuleHooks for LoggingHooks {
	fn load(&self, provisions: &HashMap<String, String>) -> Result<(), String> {
		if self.fails {
			return Err("module declared @fail".to_owned());
		}

		log::trace!("module body: {}", self.body);
		if !provisions.is_empty() {
			log::debug!("resolved provisions: {provisions:?}");
		}
		Ok(())
	}

	fn unload(&self) {
		log::trace!("module unloaded");
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parses_header_and_keeps_body_unexecuted() {
		let compiler = ManifestCompiler;
		let source = "@priority -10\n@provides db\n@requires config\n\nthis is opaque body text";
		let compiled = compiler.compile_source(VPath::new("/mod.lt"), source).unwrap();

		assert_eq!(compiled.priority, -10);
		assert_eq!(compiled.provides, vec!["db".to_owned()]);
		assert_eq!(compiled.requires, vec!["config".to_owned()]);
		assert_eq!(compiled.body, "this is opaque body text");
	}

	#[test]
	fn missing_header_defaults_to_neutral_priority() {
		let compiler = ManifestCompiler;
		let compiled = compiler.compile_source(VPath::new("/mod.lt"), "\njust a body").unwrap();
		assert_eq!(compiled.priority, PRIORITY_NEUTRAL);
		assert!(compiled.provides.is_empty());
	}

	#[test]
	fn fail_directive_makes_the_hook_error() {
		let compiler = ManifestCompiler;
		let compiled = compiler.compile_source(VPath::new("/mod.lt"), "@fail\n\nbody").unwrap();
		let (_record, hooks) = compiled.into_parts("broken");
		assert!(hooks.load(&HashMap::new()).is_err());
	}

	#[test]
	fn rejects_bytecode_with_the_wrong_magic() {
		let compiler = ManifestCompiler;
		let bytes = header::encode(b"OTHR", 0, b"whatever");
		let header = header::decode(VPath::new("/mod.ltc"), &bytes, &compiler.magic());
		assert!(matches!(header, Err(lantern_importer::ImportError::BadMagic(_))));
	}
}
