// Courtside entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Parse arguments and load config
// 3. Load the player CSV and score it
// 4. Run the requested command, or the interactive session

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use courtside_cli::cli::{Cli, Command};
use courtside_cli::commands::{self, Render};
use courtside_cli::output;
use courtside_cli::session::Session;
use courtside_core::config;
use courtside_core::players;
use courtside_core::table::PlayerTable;

const EXIT_CONFIG: i32 = 2;
const EXIT_DATA: i32 = 3;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Courtside starting up");

    let cli = Cli::parse();
    if let Err(e) = cli.check() {
        e.exit();
    }
    let command = cli.command.clone().unwrap_or(Command::Overview);

    let base_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };

    let config = match config::load_config_in(&base_dir) {
        Ok(c) => c,
        Err(e) => {
            error!("Config error: {}", e);
            eprintln!("Config error: {e}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    let data_path = resolve_data_path(&base_dir, cli.data.as_deref(), &config.data_paths.players);
    info!("Loading players from {}", data_path.display());

    // Without a table there is nothing to compute.
    let records = match players::load_players(&data_path) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to load players: {}", e);
            eprintln!("Failed to load player data: {e}");
            std::process::exit(EXIT_DATA);
        }
    };
    info!("Loaded {} players", records.len());

    let table = PlayerTable::from_records(records, config.scoring);
    let use_colors = output::should_use_colors();

    if command == Command::Session {
        let mut session = Session::new(table, config.query.clone(), use_colors);
        let stdin = std::io::stdin();
        return session.run(stdin.lock(), std::io::stdout().lock());
    }

    let render = if cli.json {
        Render::json()
    } else {
        Render::text(use_colors)
    };
    let text = commands::run(&command, &table, &config, render)?;
    println!("{text}");
    Ok(())
}

/// `--data` wins over the configured path; relative paths resolve against
/// the base directory.
fn resolve_data_path(base_dir: &Path, cli_data: Option<&Path>, configured: &str) -> PathBuf {
    let path = cli_data.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(configured));
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

/// Initialize tracing to write to a log file.
///
/// Logs go to `logs/courtside.log` so terminal output stays clean.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("courtside.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtside=info,courtside_cli=info,courtside_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
