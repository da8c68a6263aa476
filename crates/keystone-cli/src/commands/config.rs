//! `keystone config`: inspect the resolved configuration.

use std::path::Path;

use anyhow::{Context, Result};
use keystone_config::loader::WORKSPACE_FILE;
use keystone_config::{ConfigResult, LoadSources, ResolvedConfig};

use super::OutputFormat;
use crate::theme::Theme;

pub(crate) fn show_config(resolved: &ResolvedConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resolved.config)?);
        },
        OutputFormat::Pretty => {
            for path in &resolved.loaded_files {
                println!("# from {}", path.display());
            }
            print!("{}", resolved.to_toml().context("failed to render configuration")?);
        },
    }
    Ok(())
}

pub(crate) fn validate_config(loaded: ConfigResult<ResolvedConfig>) -> Result<()> {
    let resolved = loaded.context("configuration is invalid")?;
    println!("{}", Theme::success("Configuration is valid"));
    for path in &resolved.loaded_files {
        println!("  {}", Theme::dimmed(&path.display().to_string()));
    }
    Ok(())
}

pub(crate) fn show_paths(workspace_root: Option<&Path>, explicit: Option<&Path>) {
    let sources = LoadSources::discover(workspace_root, explicit);
    let project = sources
        .explicit
        .clone()
        .or_else(|| sources.workspace_root.as_ref().map(|r| r.join(WORKSPACE_FILE)));

    println!("{}", Theme::header("Config files (lowest to highest precedence)"));
    for (label, path) in [("user", sources.user_file), ("project", project)] {
        match path {
            Some(path) => {
                let state = if path.is_file() { "found" } else { "missing" };
                println!("  {label:<8} {} {}", path.display(), Theme::dimmed(state));
            },
            None => println!("  {label:<8} {}", Theme::dimmed("not applicable")),
        }
    }
}
