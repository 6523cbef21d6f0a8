//! Ambra CLI - Layered Ambient Music Mixer
//!
//! Command-line interface for inspecting and dry-running mixer configs.

use clap::Parser;
use env_logger::Env;
use log::info;

use ambra::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Ambra v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Ambra v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Init { path, force } => commands::init(&path, force)?,
        Commands::Validate { path } => commands::validate(&path)?,
        Commands::Diff { path, from, to } => {
            commands::diff_presets(&path, from.as_deref(), &to)?
        }
        Commands::Simulate {
            path,
            preset,
            seconds,
            fps,
            stopped,
        } => commands::simulate(&path, preset.as_deref(), seconds, fps, stopped)?,
    }
    Ok(())
}
