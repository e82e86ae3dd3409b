//! Nuclear CLI - drive chain-reaction lattices from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nuclear")]
#[command(author, version, about = "Nuclear chain-reaction lattice CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a WAV file through a channel lattice, period by period
    Process(commands::process::ProcessArgs),

    /// Drive synthetic ticks through a lattice and report latency
    Stress(commands::stress::StressArgs),

    /// Create, show, and validate lattice configuration files
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for --json output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Stress(args) => commands::stress::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
