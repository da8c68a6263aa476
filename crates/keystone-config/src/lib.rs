//! Configuration for the Keystone extension host.
//!
//! A single [`Config`] with `[plugins]` and `[logging]` sections, loaded
//! from layered TOML files.
//!
//! # Usage
//!
//! ```rust,no_run
//! use keystone_config::Config;
//!
//! # fn main() -> Result<(), keystone_config::ConfigError> {
//! let resolved = Config::load(Some(std::path::Path::new(".")), None)?;
//! for path in &resolved.config.plugins.paths {
//!     println!("plugin: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Precedence
//!
//! From highest to lowest:
//!
//! 1. The file passed explicitly, or `{workspace}/keystone.toml`
//! 2. The user file (`$XDG_CONFIG_HOME/keystone/config.toml` on Linux)
//! 3. Environment fallbacks: `KEYSTONE_LOG_LEVEL` applies only when no file
//!    sets the level, `KEYSTONE_PLUGIN_PATHS` is always appended
//! 4. Embedded defaults
//!
//! This crate does not depend on the plugin or telemetry crates. The host
//! converts these types at startup.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Configuration error types.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Layer merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadSources, ResolvedConfig};
pub use types::*;

impl Config {
    /// Load with the full precedence chain, discovering the user file and
    /// reading `KEYSTONE_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed, the explicit file
    /// is missing, or the result fails validation.
    pub fn load(
        workspace_root: Option<&std::path::Path>,
        explicit: Option<&std::path::Path>,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadSources::discover(workspace_root, explicit))
    }

    /// Load from a single file over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
