//! Resolves and loads modules by dotted name against package roots backed
//! by a session's virtual file system.

use indexmap::IndexMap;
use lantern_vfs::{VPath, VPathBuf};

use crate::compiler::Compiler;
use crate::error::ImportError;
use crate::header;
use crate::source::decode_source;

/// Where [`Importer::resolve`] found a module, before it's been read and
/// compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedModule {
	/// An exact match on a registered root name: a package with no source
	/// of its own, matching `EmptyPackageLoader`.
	EmptyPackage,
	Source {
		path: VPathBuf,
		package_path: Option<VPathBuf>,
	},
	Bytecode {
		path: VPathBuf,
		package_path: Option<VPathBuf>,
	},
}

/// The result of [`Importer::load`].
pub enum LoadedModule<T> {
	EmptyPackage,
	Compiled { output: T, package_path: Option<VPathBuf> },
}

/// Registers package roots (`name -> search paths`) and resolves/loads
/// dotted module names against them through whichever session's file system
/// is current, with no dependency on a host import system.
pub struct Importer {
	roots: IndexMap<String, Vec<VPathBuf>>,
	source_extensions: Vec<String>,
	bytecode_extensions: Vec<String>,
	package_init: String,
}

impl Default for Importer {
	fn default() -> Self {
		Self::new()
	}
}

impl Importer {
	#[must_use]
	pub fn new() -> Self {
		Self {
			roots: IndexMap::new(),
			source_extensions: vec![".lt".to_owned()],
			bytecode_extensions: vec![".ltc".to_owned()],
			package_init: "__init__".to_owned(),
		}
	}

	/// Overrides the default single source/bytecode extension pair. Source
	/// extensions are always tried before bytecode ones.
	#[must_use]
	pub fn with_extensions(mut self, source: Vec<String>, bytecode: Vec<String>) -> Self {
		self.source_extensions = source;
		self.bytecode_extensions = bytecode;
		self
	}

	#[must_use]
	pub fn with_package_init(mut self, name: impl Into<String>) -> Self {
		self.package_init = name.into();
		self
	}

	pub fn register_root(&mut self, name: impl Into<String>, search_paths: Vec<VPathBuf>) {
		self.roots.insert(name.into(), search_paths);
	}

	pub fn search_paths(&self, root: &str) -> Result<&[VPathBuf], ImportError> {
		self.roots
			.get(root)
			.map(Vec::as_slice)
			.ok_or_else(|| ImportError::UnknownRoot(root.to_owned()))
	}

	/// Locates `name` (a dotted module path) without reading it. Walks every
	/// search path of the longest matching registered root, in
	/// registration order, trying single-file candidates for every
	/// configured extension before package-init candidates. Every search
	/// path is tried in turn, not just the first, since that's what having
	/// a list of them should mean.
	pub fn resolve(&self, name: &str) -> Result<ResolvedModule, ImportError> {
		if self.roots.contains_key(name) {
			return Ok(ResolvedModule::EmptyPackage);
		}

		let (root_name, search_paths) = self.find_root(name).ok_or_else(|| ImportError::NotFound(name.to_owned()))?;
		let rel = name[root_name.len() + 1..].replace('.', "/");

		let session = lantern_session::current_or_engine().ok_or_else(|| ImportError::NotFound(name.to_owned()))?;

		for search_path in search_paths {
			let base = search_path.as_path().join(&rel);

			for ext in self.source_extensions.iter().chain(self.bytecode_extensions.iter()) {
				let candidate = VPathBuf::from(format!("{base}{ext}").as_str());
				if session.fs.isfile(candidate.as_path()) {
					return Ok(self.classify(candidate, None, ext));
				}
			}

			for ext in self.source_extensions.iter().chain(self.bytecode_extensions.iter()) {
				let candidate = base.as_path().join(&format!("{}{}", self.package_init, ext));
				if session.fs.isfile(candidate.as_path()) {
					return Ok(self.classify(candidate, Some(base.clone()), ext));
				}
			}
		}

		Err(ImportError::NotFound(name.to_owned()))
	}

	fn find_root(&self, name: &str) -> Option<(&str, &[VPathBuf])> {
		let mut best: Option<(&str, &[VPathBuf])> = None;

		for (root_name, paths) in &self.roots {
			let prefix_len = root_name.len();
			if name.len() > prefix_len && name.starts_with(root_name.as_str()) && name.as_bytes()[prefix_len] == b'.' {
				let better = match best {
					Some((b, _)) => root_name.len() > b.len(),
					None => true,
				};
				if better {
					best = Some((root_name.as_str(), paths.as_slice()));
				}
			}
		}

		best
	}

	fn classify(&self, path: VPathBuf, package_path: Option<VPathBuf>, ext: &str) -> ResolvedModule {
		if self.source_extensions.iter().any(|e| e == ext) {
			ResolvedModule::Source { path, package_path }
		} else {
			ResolvedModule::Bytecode { path, package_path }
		}
	}

	/// Resolves, reads, and compiles `name` through `compiler`.
	pub fn load<C: Compiler>(&self, name: &str, compiler: &C) -> Result<LoadedModule<C::Output>, ImportError> {
		match self.resolve(name)? {
			ResolvedModule::EmptyPackage => Ok(LoadedModule::EmptyPackage),
			ResolvedModule::Source { path, package_path } => {
				let bytes = self.read(path.as_path())?;
				let source = decode_source(&bytes);
				let output = compiler.compile_source(path.as_path(), &source)?;
				Ok(LoadedModule::Compiled { output, package_path })
			}
			ResolvedModule::Bytecode { path, package_path } => {
				let bytes = self.read(path.as_path())?;
				let header = header::decode(path.as_path(), &bytes, &compiler.magic())?;
				let output = compiler.compile_bytecode(path.as_path(), header.payload)?;
				Ok(LoadedModule::Compiled { output, package_path })
			}
		}
	}

	fn read(&self, path: &VPath) -> Result<Vec<u8>, ImportError> {
		let session = lantern_session::current_or_engine().ok_or_else(|| ImportError::FileSystem {
			path: path.to_owned(),
			source: lantern_vfs::Error::NotFound(path.to_owned()),
		})?;

		let mut handle = session
			.fs
			.open(path, lantern_vfs::OpenMode::Read)
			.map_err(|e| ImportError::FileSystem { path: path.to_owned(), source: e })?;

		handle
			.read_to_end()
			.map_err(|e| ImportError::FileSystem { path: path.to_owned(), source: e })
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use lantern_providers::MemoryProvider;
	use lantern_session::Session;

	use super::*;

	struct EchoCompiler;

	impl Compiler for EchoCompiler {
		type Output = String;

		fn compile_source(&self, _path: &VPath, source: &str) -> Result<Self::Output, ImportError> {
			Ok(source.to_owned())
		}

		fn magic(&self) -> [u8; header::MAGIC_LEN] {
			*b"ECHO"
		}

		fn compile_bytecode(&self, path: &VPath, _payload: &[u8]) -> Result<Self::Output, ImportError> {
			Err(ImportError::Compile {
				path: path.to_owned(),
				message: "bytecode not supported in this test".to_owned(),
			})
		}
	}

	fn session_with(files: &[(&str, &[u8])]) -> Arc<Session> {
		let session = Session::new("test", None);
		let mem = MemoryProvider::new();
		for (path, data) in files {
			mem.insert(VPath::new(path), data.to_vec());
		}
		session.fs.mount(VPath::new("/"), Arc::new(mem));
		Arc::new(session)
	}

	#[test]
	fn resolves_single_file_module() {
		let session = session_with(&[("/scripts/greet.lt", b"say hi")]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/scripts")]);

		let resolved = importer.resolve("game.greet").unwrap();
		assert!(matches!(resolved, ResolvedModule::Source { .. }));

		let loaded = importer.load("game.greet", &EchoCompiler).unwrap();
		match loaded {
			LoadedModule::Compiled { output, package_path } => {
				assert_eq!(output, "say hi");
				assert!(package_path.is_none());
			}
			LoadedModule::EmptyPackage => panic!("expected a compiled module"),
		}
	}

	#[test]
	fn resolves_package_init() {
		let session = session_with(&[("/scripts/sub/__init__.lt", b"package body")]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/scripts")]);

		let resolved = importer.resolve("game.sub").unwrap();
		match resolved {
			ResolvedModule::Source { package_path, .. } => {
				assert_eq!(package_path.unwrap(), VPathBuf::from("/scripts/sub"));
			}
			_ => panic!("expected a source module"),
		}
	}

	#[test]
	fn root_name_alone_resolves_to_empty_package() {
		let session = session_with(&[]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/scripts")]);

		assert_eq!(importer.resolve("game").unwrap(), ResolvedModule::EmptyPackage);
	}

	#[test]
	fn missing_module_is_not_found() {
		let session = session_with(&[]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/scripts")]);

		assert!(matches!(importer.resolve("game.nope"), Err(ImportError::NotFound(_))));
	}

	#[test]
	fn searches_every_search_path_for_a_root() {
		let session = session_with(&[("/b/found.lt", b"x")]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/a"), VPathBuf::from("/b")]);

		assert!(importer.resolve("game.found").is_ok());
	}

	#[test]
	fn load_strips_and_validates_the_bytecode_header() {
		let encoded = header::encode(&EchoCompiler.magic(), 0, b"compiled body");
		let session = session_with(&[("/scripts/greet.ltc", &encoded)]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/scripts")]);

		let err = importer.load("game.greet", &EchoCompiler).unwrap_err();
		assert!(matches!(err, ImportError::Compile { .. }));
	}

	#[test]
	fn load_rejects_bytecode_with_the_wrong_magic() {
		let encoded = header::encode(b"OTHR", 0, b"compiled body");
		let session = session_with(&[("/scripts/greet.ltc", &encoded)]);
		let _guard = lantern_session::push(session);

		let mut importer = Importer::new();
		importer.register_root("game", vec![VPathBuf::from("/scripts")]);

		assert!(matches!(importer.load("game.greet", &EchoCompiler), Err(ImportError::BadMagic(_))));
	}
}

