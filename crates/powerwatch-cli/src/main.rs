//! CLI for powerwatch — your laptop's power cord is a tripwire.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "powerwatch")]
#[command(about = "powerwatch — your laptop's power cord is a tripwire")]
#[command(version = powerwatch_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live monitoring dashboard (TUI)
    Watch {
        /// Sensitivity level 1 (lenient) to 10 (paranoid); threshold is (11 - level) × 10 %
        #[arg(long, default_value = "5")]
        sensitivity: u8,

        /// Sampling cadence in seconds
        #[arg(long, default_value = "1.0")]
        refresh: f64,

        /// Start with the siren muted (visual alerts only)
        #[arg(long)]
        mute: bool,

        /// Journal directory (default: ~/.security_logs)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Print a one-shot status snapshot
    Status {
        /// Emit machine-readable JSON instead of the text summary
        #[arg(long)]
        json: bool,
    },

    /// Print a day's journal file
    Logs {
        /// Day to print as YYYYMMDD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Journal directory (default: ~/.security_logs)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            sensitivity,
            refresh,
            mute,
            log_dir,
        } => commands::watch::run(sensitivity, refresh, mute, log_dir),
        Commands::Status { json } => commands::status::run(json),
        Commands::Logs { date, log_dir } => commands::logs::run(date.as_deref(), log_dir),
    }
}
