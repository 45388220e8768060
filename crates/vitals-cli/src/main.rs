//! CLI for vitals — your machine's vital signs, without the guesswork.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "vitals — live terminal resource monitor for Linux")]
#[command(version = vitals_core::VERSION)]
struct Cli {
    /// Path to a JSON config file (default: ./vitals.json, then
    /// ~/.config/vitals/config.json, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live interactive dashboard (TUI)
    Monitor {
        /// UI redraw interval in seconds (collectors keep their own cadences)
        #[arg(long, default_value = "1.0")]
        refresh: f64,
    },

    /// Capture one snapshot and print it as JSON
    Snapshot {
        /// Comma-separated collector names, or "all"
        #[arg(long, default_value = "all")]
        collectors: String,

        /// Seconds between the two samples that rate metrics need
        #[arg(long, default_value = "1.0")]
        warmup: f64,

        /// Compact single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,

        /// Write the JSON to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a plain-text summary on every cycle (pipe-friendly)
    Watch {
        /// Seconds between printed summaries
        #[arg(long, default_value = "2.0")]
        interval: f64,

        /// Comma-separated collector names, or "all"
        #[arg(long, default_value = "all")]
        collectors: String,
    },

    /// List the available collectors and their default cadences
    List,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Monitor { refresh } => commands::monitor::run(&config, refresh),
        Commands::Snapshot {
            collectors,
            warmup,
            compact,
            output,
        } => commands::snapshot::run(&config, &collectors, warmup, compact, output.as_deref()),
        Commands::Watch {
            interval,
            collectors,
        } => commands::watch::run(&config, interval, &collectors),
        Commands::List => commands::list::run(&config),
    }
}
