//! Plugin trait and lifecycle capabilities.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// A named unit of extension logic loaded into the host.
///
/// The only required capability is [`name`](Plugin::name). A plugin that
/// also wants lifecycle notifications implements [`InitHandler`] and/or
/// [`ShutdownHandler`] and advertises them by overriding the matching
/// `as_*` query:
///
/// ```rust
/// use std::sync::Arc;
/// use keystone_plugin::{Plugin, ShutdownHandler};
///
/// struct Cache;
///
/// impl Plugin for Cache {
///     fn name(&self) -> &str {
///         "cache"
///     }
///
///     fn as_shutdown_handler(self: Arc<Self>) -> Option<Arc<dyn ShutdownHandler>> {
///         Some(self)
///     }
/// }
///
/// #[async_trait::async_trait]
/// impl ShutdownHandler for Cache {
///     async fn handle_shutdown(&self) {}
/// }
/// ```
pub trait Plugin: Any + Send + Sync {
    /// The unique name this plugin is registered under.
    fn name(&self) -> &str;

    /// Returns this plugin as an init listener, if it is one.
    fn as_init_handler(self: Arc<Self>) -> Option<Arc<dyn InitHandler>> {
        None
    }

    /// Returns this plugin as a shutdown listener, if it is one.
    fn as_shutdown_handler(self: Arc<Self>) -> Option<Arc<dyn ShutdownHandler>> {
        None
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Notified whenever another plugin is newly loaded.
///
/// Handlers run on the configuring task, one plugin at a time, and must not
/// assume they are the only listener. A panicking handler is logged and
/// skipped.
#[async_trait]
pub trait InitHandler: Send + Sync {
    /// Called with each plugin loaded after this handler was registered.
    async fn handle_plugin_init(&self, plugin: Arc<dyn Plugin>);
}

/// Notified when the host is stopping.
#[async_trait]
pub trait ShutdownHandler: Send + Sync {
    /// Release whatever the plugin holds. Runs concurrently with other handlers.
    async fn handle_shutdown(&self);
}

/// Print the standard entry-point banner for a plugin binary.
///
/// Plugin crates that also build an executable call this from `main` so
/// running the artifact directly identifies what it is.
pub fn announce(name: &str) {
    println!("{}", banner(name));
}

fn banner(name: &str) -> String {
    format!("{name} - a plugin for keystone")
}
