//! `keystone run`: load plugins, wait, shut down.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use keystone_config::Config;
use keystone_plugin::{PluginError, PluginManager};
use tracing::info;

use super::OutputFormat;
use crate::config_bridge;
use crate::theme::Theme;

/// Options for a host run.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunOptions {
    /// Libraries given on the command line, registered after configured ones.
    pub(crate) paths: Vec<PathBuf>,
    /// Fail when any plugin fails to load.
    pub(crate) strict: bool,
    /// Shut down right after loading instead of waiting for Ctrl-C.
    pub(crate) once: bool,
}

pub(crate) async fn run_host(config: &Config, opts: RunOptions, format: OutputFormat) -> Result<()> {
    let paths = config_bridge::plugin_paths(config, opts.paths);
    info!(count = paths.len(), "Registering plugin libraries");

    let manager = PluginManager::with_paths(paths);
    let errors = manager.configure().await;
    let loaded = manager.loaded();
    print_report(format, &loaded, &errors)?;

    if !errors.is_empty() && (opts.strict || config.plugins.strict) {
        manager.shutdown().await;
        bail!("{} plugin(s) failed to load", errors.len());
    }

    if !opts.once {
        if format == OutputFormat::Pretty {
            println!("{}", Theme::dimmed("Running. Press Ctrl-C to stop."));
        }
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
    }

    info!("Shutting down plugins");
    manager.shutdown().await;
    Ok(())
}

fn summary(loaded: &[String], errors: &[PluginError]) -> serde_json::Value {
    serde_json::json!({
        "loaded": loaded,
        "errors": errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn print_report(format: OutputFormat, loaded: &[String], errors: &[PluginError]) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let doc = serde_json::to_string_pretty(&summary(loaded, errors))?;
            println!("{doc}");
        },
        OutputFormat::Pretty => {
            println!("{}", Theme::header("Plugins"));
            if loaded.is_empty() {
                println!("  {}", Theme::dimmed("none loaded"));
            }
            for name in loaded {
                println!("  {}", Theme::success(name));
            }
            for error in errors {
                println!("  {}", Theme::error(&error.to_string()));
            }
        },
    }
    Ok(())
}
