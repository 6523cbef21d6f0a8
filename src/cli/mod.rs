//! CLI Module
//!
//! Command-line interface for inspecting and dry-running mixer configs.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ambra - layered ambient music mixer
#[derive(Parser, Debug)]
#[command(name = "ambra")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter config with an example soundscape
    #[command(name = "init")]
    Init {
        /// Path for the new config file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Check a config file against the mixer's invariants
    #[command(name = "validate")]
    Validate {
        /// Path to the config file
        path: PathBuf,
    },

    /// Show the operations a crossfade between two presets would run
    #[command(name = "diff")]
    Diff {
        /// Path to the config file
        path: PathBuf,

        /// Preset to start from (startup sounds when omitted)
        #[arg(short, long)]
        from: Option<String>,

        /// Preset to crossfade to
        #[arg(short, long)]
        to: String,
    },

    /// Run a headless mixer and print the layer timeline
    #[command(name = "simulate")]
    Simulate {
        /// Path to the config file
        path: PathBuf,

        /// Preset to crossfade to after one simulated second
        #[arg(short, long)]
        preset: Option<String>,

        /// Simulated length in seconds
        #[arg(short, long, default_value_t = 6.0)]
        seconds: f64,

        /// Ticks per simulated second
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Keep the transport stopped for the whole run
        #[arg(long)]
        stopped: bool,
    },
}
