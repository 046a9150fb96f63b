//! Lantern engine bootstrap binary.

use clap::Parser;
use indoc::printdoc;

use lantern::bootstrap;
use lantern::error::{self, BootstrapError};

#[derive(Parser, Debug)]
#[command(name = "lantern", version, about = "A modular and extensible virtual file system core.")]
struct Cli {
	/// Print license information and exit.
	#[arg(short = 'A', long = "about")]
	about: bool,

	/// Bootstrapper used to bring up the engine. (default: "filesystem")
	#[arg(short = 'b', long = "bootstrapper")]
	bootstrapper: Option<String>,

	/// Bootstrapper used to bring up the game. (default: "filesystem")
	#[arg(short = 'B', long = "game-bootstrapper")]
	game_bootstrapper: Option<String>,

	/// Enable debug-level logging.
	#[arg(short = 'd', long = "debug")]
	debug: bool,

	/// The game to run. Format dependent on the bootstrapper used.
	game: Option<String>,
}

fn init_logging(debug: bool) {
	let level = if debug { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<(), BootstrapError> {
	let mut lantern = bootstrap::bootstrap_engine(cli.bootstrapper.as_deref())?;

	let _game_guard = match &cli.game {
		Some(base) => {
			let (_session, guard) = bootstrap::bootstrap_game(&mut lantern, cli.game_bootstrapper.as_deref(), base)?;
			Some(guard)
		}
		None => None,
	};

	log::info!("lantern is up");
	Ok(())
}

fn main() {
	let cli = Cli::parse();

	if cli.about {
		printdoc! {"
			Lantern - a modular and extensible virtual file system core.

			This program comes with ABSOLUTELY NO WARRANTY.
			"
		};
		return;
	}

	init_logging(cli.debug);

	if let Err(err) = run(&cli) {
		error::print_chain(&err);
		std::process::exit(1);
	}
}
