//! Two-stage bootstrap: engine first, then an optional game layered on top.

use std::path::PathBuf;
use std::sync::Arc;

use lantern_importer::{Importer, LoadedModule};
use lantern_modularity::Engine as ModularityEngine;
use lantern_session::{Session, SessionGuard};
use lantern_vfs::{VPath, VPathBuf};

use crate::bootstrappers;
use crate::error::BootstrapError;
use crate::module::ManifestCompiler;

pub const ENGINE_MOUNT: &str = "/.lantern";
pub const MODULE_MOUNT: &str = "/.modules";
pub const COMMON_MOUNT: &str = "/.common";
pub const GAME_MOUNT: &str = "/";

pub const ENGINE_PACKAGE: &str = "engine";
pub const MODULE_PACKAGE: &str = "modules";
pub const GAME_PACKAGE: &str = "game";

/// Everything a bootstrapped process needs to keep alive: the one engine
/// session, the module importer, and the resolved module graph.
pub struct Lantern {
	pub engine: Arc<Session>,
	pub importer: Importer,
	pub modules: ModularityEngine,
}

/// Bootstraps the engine session: mounts the well-known engine roots,
/// registers the `engine`/`modules` package roots, and imports and loads
/// every module found under `/.modules`.
pub fn bootstrap_engine(bootstrapper_name: Option<&str>) -> Result<Lantern, BootstrapError> {
	log::info!("bootstrapping engine");
	let bootstrapper = bootstrappers::find(bootstrapper_name)?;
	let session = Arc::new(Session::new("engine", None));

	bootstrapper.bootstrap_engine_filesystem(&session.fs)?;
	lantern_session::set_engine_session(session.clone());

	let mut importer = Importer::new();
	importer.register_root(ENGINE_PACKAGE, vec![VPathBuf::from(ENGINE_MOUNT)]);
	importer.register_root(MODULE_PACKAGE, vec![VPathBuf::from(MODULE_MOUNT)]);

	let mut modules = ModularityEngine::new();
	load_modules(&importer, &mut modules);

	log::info!("engine bootstrapped");
	Ok(Lantern { engine: session, importer, modules })
}

/// Bootstraps a game session layered on top of the engine one: a fresh
/// `FileSystem` whose root falls back to the engine's, shadowed by the
/// game's own directory, plus a game-local module directory. Returns the
/// new session and the guard that keeps it current until dropped; module
/// resolution happens with this session pushed, so a game module of the
/// same name shadows an engine one.
pub fn bootstrap_game(lantern: &mut Lantern, bootstrapper_name: Option<&str>, base: &str) -> Result<(Arc<Session>, SessionGuard), BootstrapError> {
	log::info!("bootstrapping game: {base}");
	let bootstrapper = bootstrappers::find(bootstrapper_name)?;

	let name = PathBuf::from(base)
		.file_name()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_else(|| base.to_owned());

	let session = Arc::new(Session::new(name, Some(base.to_owned())));
	bootstrapper.bootstrap_game_filesystem(&session.fs, Arc::clone(&lantern.engine.fs), base)?;

	lantern.importer.register_root(GAME_PACKAGE, vec![VPathBuf::from(GAME_MOUNT)]);

	let guard = lantern_session::push(session.clone());
	load_modules(&lantern.importer, &mut lantern.modules);

	log::info!("game bootstrapped: {}", session.name);
	Ok((session, guard))
}

/// Imports every non-package `@`-manifest module under the current
/// session's `/.modules` and registers it with the Modularity Engine, then
/// loads everything registered so far. Mirrors `_load_all_modules` plus
/// `load_all`.
fn load_modules(importer: &Importer, modules: &mut ModularityEngine) {
	let Some(session) = lantern_session::current_or_engine() else {
		return;
	};

	let entries = match session.fs.listdir(Some(VPath::new(MODULE_MOUNT))) {
		Ok(entries) => entries,
		Err(e) => {
			log::debug!("no module directory to scan: {e}");
			return;
		}
	};

	let compiler = ManifestCompiler;

	for entry in entries {
		if entry.starts_with("__") {
			continue;
		}

		let Some(stem) = entry.strip_suffix(".lt") else {
			continue;
		};

		let qualified = format!("{MODULE_PACKAGE}.{stem}");

		match importer.load(&qualified, &compiler) {
			Ok(LoadedModule::Compiled { output, .. }) => {
				let (record, hooks) = output.into_parts(qualified.clone());
				modules.register(record, Arc::new(hooks));
			}
			Ok(LoadedModule::EmptyPackage) => {}
			Err(e) => log::error!("could not import module {qualified}: {e}"),
		}
	}

	modules.load_all();
}
