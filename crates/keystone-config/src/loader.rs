//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the user file (`$XDG_CONFIG_HOME/keystone/config.toml` or the
//!    platform equivalent)
//! 3. Merge the explicit `--config` file if given, else `{workspace}/keystone.toml`
//! 4. Apply environment fallbacks
//! 5. Deserialize and validate

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// File name looked up in the workspace root.
pub const WORKSPACE_FILE: &str = "keystone.toml";

/// Sets `logging.level` when no file does.
pub const LOG_LEVEL_VAR: &str = "KEYSTONE_LOG_LEVEL";

/// Extra plugin paths, separated like `PATH`, appended to `plugins.paths`.
pub const PLUGIN_PATHS_VAR: &str = "KEYSTONE_PLUGIN_PATHS";

/// Where each layer comes from.
#[derive(Debug, Clone, Default)]
pub struct LoadSources {
    /// User-level config file. Skipped if missing.
    pub user_file: Option<PathBuf>,
    /// Directory searched for [`WORKSPACE_FILE`]. Skipped if missing.
    pub workspace_root: Option<PathBuf>,
    /// File given on the command line. Must exist; replaces the workspace file.
    pub explicit: Option<PathBuf>,
    /// Environment snapshot used for fallbacks.
    pub env: HashMap<String, String>,
}

impl LoadSources {
    /// Discover the user file and snapshot the process environment.
    #[must_use]
    pub fn discover(workspace_root: Option<&Path>, explicit: Option<&Path>) -> Self {
        Self {
            user_file: user_config_file(),
            workspace_root: workspace_root.map(Path::to_path_buf),
            explicit: explicit.map(Path::to_path_buf),
            env: std::env::vars()
                .filter(|(k, _)| k.starts_with("KEYSTONE_"))
                .collect(),
        }
    }
}

/// A loaded configuration and the files that contributed to it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// Files merged over the defaults, in order.
    pub loaded_files: Vec<PathBuf>,
}

impl ResolvedConfig {
    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if rendering fails.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }
}

/// Load configuration from `sources`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file cannot be read or parsed, if the
/// explicit file is missing, or if the merged result fails validation.
pub fn load(sources: &LoadSources) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut from_files = BTreeSet::new();
    let mut loaded_files = Vec::new();

    if let Some(path) = &sources.user_file
        && let Some(overlay) = try_load_file(path)?
    {
        deep_merge(&mut merged, &overlay, "", &mut from_files);
        info!(path = %path.display(), "loaded user config");
        loaded_files.push(path.clone());
    }

    let project = if let Some(path) = &sources.explicit {
        Some((read_file(path)?, path.clone()))
    } else if let Some(root) = &sources.workspace_root {
        let path = root.join(WORKSPACE_FILE);
        try_load_file(&path)?.map(|overlay| (overlay, path))
    } else {
        None
    };
    if let Some((overlay, path)) = project {
        deep_merge(&mut merged, &overlay, "", &mut from_files);
        info!(path = %path.display(), "loaded project config");
        loaded_files.push(path);
    }

    apply_env_fallbacks(&mut merged, &from_files, &sources.env);

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
    })
}

/// Load a single file over the defaults, without layering or env fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed or validated.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = read_file(path)?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

fn apply_env_fallbacks(
    merged: &mut toml::Value,
    from_files: &BTreeSet<String>,
    env: &HashMap<String, String>,
) {
    let Some(root) = merged.as_table_mut() else {
        return;
    };

    if let Some(level) = env.get(LOG_LEVEL_VAR)
        && !from_files.contains("logging.level")
        && let Some(toml::Value::Table(logging)) = root.get_mut("logging")
    {
        debug!(var = LOG_LEVEL_VAR, level = %level, "applying environment fallback");
        logging.insert("level".to_owned(), toml::Value::String(level.clone()));
    }

    if let Some(raw) = env.get(PLUGIN_PATHS_VAR)
        && let Some(toml::Value::Table(plugins)) = root.get_mut("plugins")
        && let Some(toml::Value::Array(paths)) = plugins.get_mut("paths")
    {
        let extra: Vec<_> = std::env::split_paths(raw)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| toml::Value::String(p.to_string_lossy().into_owned()))
            .collect();
        debug!(var = PLUGIN_PATHS_VAR, count = extra.len(), "appending plugin paths");
        paths.extend(extra);
    }
}

fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_file(path, &content)
}

/// Like [`read_file`], but a missing file is `None`.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_file(path, &content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            Ok(None)
        },
        Err(e) => Err(ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse_file(path: &Path, content: &str) -> ConfigResult<toml::Value> {
    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "keystone").map(|d| d.config_dir().join("config.toml"))
}
