//! Plugin error types.

use std::path::PathBuf;

/// Errors from plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The requested plugin is not loaded.
    #[error("no plugin named {0}")]
    NotFound(String),

    /// A plugin with this name was already loaded; the new instance was discarded.
    #[error("plugin already loaded: {0}")]
    AlreadyLoaded(String),

    /// The loaded plugin is not of the requested concrete type.
    #[error("plugin {name} is not a {expected}")]
    TypeMismatch {
        /// Name the lookup was made with.
        name: String,
        /// Type name the caller asked for.
        expected: &'static str,
    },

    /// The plugin library could not be opened.
    #[error("unable to open plugin ({path}): {source}")]
    Open {
        /// Path of the library.
        path: PathBuf,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },

    /// The plugin library does not export the declaration symbol.
    #[error("plugin does not export {symbol} ({path}): {source}")]
    MissingSymbol {
        /// Path of the library.
        path: PathBuf,
        /// Symbol that was looked up.
        symbol: &'static str,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },

    /// The exported declaration does not match the host's plugin contract.
    #[error(
        "plugin has invalid declaration ({path}): expected abi {expected_abi} for keystone \
         {expected_core}, found abi {found_abi} for keystone {found_core}"
    )]
    InvalidDeclaration {
        /// Path of the library.
        path: PathBuf,
        /// ABI version the host understands.
        expected_abi: u32,
        /// ABI version the plugin declared.
        found_abi: u32,
        /// Core crate version of the host.
        expected_core: String,
        /// Core crate version the plugin was built against.
        found_core: String,
    },

    /// A file-backed plugin's factory returned an error.
    #[error("plugin init failed ({path}): {source}")]
    Construction {
        /// Path of the library.
        path: PathBuf,
        /// Error returned by the factory.
        #[source]
        source: Box<PluginError>,
    },

    /// An initializer failed during batch configuration.
    #[error("plugin init failed: {0}")]
    InitFailed(#[source] Box<PluginError>),

    /// A plugin required another plugin that is not loaded.
    #[error("{plugin}: required dependency missing ({dependency})")]
    MissingDependency {
        /// Plugin being constructed.
        plugin: String,
        /// Name of the plugin it depends on.
        dependency: String,
    },

    /// An initializer panicked instead of returning.
    #[error("initializer panicked: {0}")]
    Panicked(String),

    /// A plugin failed to initialize for a plugin-specific reason.
    #[error("{0}")]
    Initialization(String),
}

impl PluginError {
    /// Create a plugin-specific initialization failure.
    #[must_use]
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// Whether this error reports a name collision.
    #[must_use]
    pub fn is_already_loaded(&self) -> bool {
        matches!(self, Self::AlreadyLoaded(_))
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_context_prefixes_cause() {
        let err = PluginError::InitFailed(Box::new(PluginError::initialization("boom")));
        assert_eq!(err.to_string(), "plugin init failed: boom");
    }

    #[test]
    fn panic_message_is_kept() {
        let err = PluginError::InitFailed(Box::new(PluginError::Panicked("no vm".into())));
        assert_eq!(err.to_string(), "plugin init failed: initializer panicked: no vm");
    }

    #[test]
    fn duplicate_message_names_plugin() {
        let err = PluginError::AlreadyLoaded("babel".into());
        assert_eq!(err.to_string(), "plugin already loaded: babel");
        assert!(err.is_already_loaded());
    }

    #[test]
    fn construction_error_names_path() {
        let err = PluginError::Construction {
            path: PathBuf::from("/opt/plugins/libvm.so"),
            source: Box::new(PluginError::MissingDependency {
                plugin: "babel".into(),
                dependency: "vm".into(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "plugin init failed (/opt/plugins/libvm.so): babel: required dependency missing (vm)"
        );
    }
}
