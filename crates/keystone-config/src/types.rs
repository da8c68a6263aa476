//! Configuration types.
//!
//! Every section implements [`Default`], so an empty file or a bare
//! `[section]` header yields a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin libraries to load.
    pub plugins: PluginsSection,
    /// Logging level, format and directives.
    pub logging: LoggingSection,
}

/// `[plugins]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Shared libraries registered, in order, before the first configure.
    pub paths: Vec<PathBuf>,
    /// Treat any error from configure as fatal.
    pub strict: bool,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Per-target directives such as `keystone_plugin=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert!(config.plugins.paths.is_empty());
        assert!(!config.plugins.strict);
    }
}
