//! Lattice configuration commands.
//!
//! Provides commands to create, show, and validate lattice config files.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use nuclear_config::{LatticeConfig, default_config_path};

use super::common::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Destination (defaults to the user config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show {
        /// Configuration file (defaults to the user config, then built-ins)
        path: Option<PathBuf>,
    },

    /// Check a configuration file and summarise it
    Validate {
        /// Configuration file
        path: PathBuf,
    },
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(default_config_path);
            LatticeConfig::default().save_new(&path, force)?;
            println!("Wrote {}", path.display());
        }
        ConfigCommand::Show { path } => {
            let config = load_config(path.as_deref())?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Validate { path } => {
            let config = LatticeConfig::load(&path)?;
            println!("{} is valid", path.display());
            println!(
                "  '{}': {} in, {} out, {} lane(s), period {} frames ({:.2} ms at {} Hz)",
                config.name,
                config.in_channels,
                config.out_channels,
                config.lanes(),
                config.period_frames,
                config.period_ms(),
                config.sample_rate
            );
        }
    }
    Ok(())
}
