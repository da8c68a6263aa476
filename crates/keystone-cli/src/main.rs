//! Keystone host.
//!
//! Loads configuration, registers plugin libraries with a
//! [`keystone_plugin::PluginManager`], runs one configure pass and keeps the
//! plugins alive until interrupted.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;
pub mod config_bridge;
mod theme;

use commands::OutputFormat;
use commands::{config, run};

/// Keystone - in-process plugin host
#[derive(Parser)]
#[command(name = "keystone")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Configuration file, used instead of ./keystone.toml
    #[arg(short, long, global = true, env = "KEYSTONE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load plugins and run until Ctrl-C
    Run {
        /// Additional plugin libraries, loaded after the configured ones
        paths: Vec<PathBuf>,

        /// Exit with an error if any plugin fails to load
        #[arg(long)]
        strict: bool,

        /// Shut down immediately after loading
        #[arg(long)]
        once: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
    /// Load and validate the configuration
    Validate,
    /// Show the config file paths being checked
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir().ok();
    let loaded = keystone_config::Config::load(workspace_root.as_deref(), cli.config.as_deref());

    // Fall back to plain info logging when the config is broken so the
    // error itself still gets reported.
    let mut log_config = match &loaded {
        Ok(resolved) => config_bridge::to_log_config(&resolved.config),
        Err(_) => keystone_telemetry::LogConfig::new("info"),
    };
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = keystone_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Run {
            paths,
            strict,
            once,
        } => {
            let resolved = loaded.context("failed to load configuration")?;
            let opts = run::RunOptions {
                paths,
                strict,
                once,
            };
            run::run_host(&resolved.config, opts, cli.format).await?;
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let resolved = loaded.context("failed to load configuration")?;
                config::show_config(&resolved, cli.format)?;
            },
            ConfigCommands::Validate => config::validate_config(loaded)?,
            ConfigCommands::Paths => {
                config::show_paths(workspace_root.as_deref(), cli.config.as_deref());
            },
        },
    }

    Ok(())
}
