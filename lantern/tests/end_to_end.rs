//! Cross-crate end-to-end scenarios driving bootstrap through real
//! directories on disk, the way `FilesystemBootstrapper` expects.

use std::fs;
use std::sync::Mutex;

use lantern::bootstrap;

/// `FilesystemBootstrapper::new` reads `LANTERN_HOME` from the process
/// environment, so tests that set it must not run concurrently.
static HOME_LOCK: Mutex<()> = Mutex::new(());

fn write(path: &std::path::Path, contents: &str) {
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, contents).unwrap();
}

#[test]
fn bootstrap_engine_mounts_well_known_roots() {
	let _guard = HOME_LOCK.lock().unwrap();
	let home = tempfile::tempdir().unwrap();
	write(&home.path().join("engine/core.lt"), "engine source");
	write(&home.path().join("common/palette.dat"), "shared data");

	std::env::set_var("LANTERN_HOME", home.path());
	let lantern = bootstrap::bootstrap_engine(None).unwrap();

	assert!(lantern.engine.fs.isfile(lantern_vfs::VPath::new("/.lantern/core.lt")));
	assert!(lantern.engine.fs.isfile(lantern_vfs::VPath::new("/.common/palette.dat")));
	std::env::remove_var("LANTERN_HOME");
}

#[test]
fn module_manifest_is_resolved_and_registered() {
	let _guard = HOME_LOCK.lock().unwrap();
	let home = tempfile::tempdir().unwrap();
	write(&home.path().join("modules/storage.lt"), "@priority -10\n@provides storage\n\nbody text");

	std::env::set_var("LANTERN_HOME", home.path());
	let lantern = bootstrap::bootstrap_engine(None).unwrap();

	assert!(lantern.modules.is_loaded("modules.storage"));
	std::env::remove_var("LANTERN_HOME");
}

#[test]
fn module_dependency_chain_with_priority_substitution() {
	let _guard = HOME_LOCK.lock().unwrap();
	let home = tempfile::tempdir().unwrap();

	// Two providers of "video": the lower-priority one is tried first per
	// ascending candidate ordering; if it fails, the higher-priority one
	// is the fallback.
	write(&home.path().join("modules/video_primary.lt"), "@priority -50\n@provides video\n\nthis candidate is broken on purpose");
	write(&home.path().join("modules/video_fallback.lt"), "@priority 40\n@provides video\n\nworks fine");
	write(&home.path().join("modules/audio.lt"), "@priority 0\n@provides audio\n\nworks fine");
	write(&home.path().join("modules/game_core.lt"), "@priority 0\n@requires video\n@requires audio\n\nworks fine");

	std::env::set_var("LANTERN_HOME", home.path());
	let lantern = bootstrap::bootstrap_engine(None).unwrap();

	assert!(lantern.modules.is_loaded("modules.audio"));
	assert!(lantern.modules.is_loaded("modules.game_core"));
	std::env::remove_var("LANTERN_HOME");
}

#[test]
fn import_path_isolation_across_engine_and_game_sessions() {
	let _guard = HOME_LOCK.lock().unwrap();
	let home = tempfile::tempdir().unwrap();
	let game_base = tempfile::tempdir().unwrap();

	write(&game_base.path().join("game/greet.lt"), "hello from the game");

	std::env::set_var("LANTERN_HOME", home.path());
	let mut lantern = bootstrap::bootstrap_engine(None).unwrap();

	let (game_session, guard) = bootstrap::bootstrap_game(&mut lantern, None, game_base.path().to_str().unwrap()).unwrap();

	assert!(game_session.fs.isfile(lantern_vfs::VPath::new("/greet.lt")));
	assert!(!lantern.engine.fs.isfile(lantern_vfs::VPath::new("/greet.lt")));

	drop(guard);
	std::env::remove_var("LANTERN_HOME");
}
