//! Echo - sample Keystone plugin.
//!
//! Logs every plugin loaded after it and logs again on shutdown. Build the
//! `cdylib` and list it under `[plugins] paths` to load it into the host:
//!
//! ```toml
//! [plugins]
//! paths = ["target/debug/libkeystone_plugin_echo.so"]
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use keystone_plugin::{
    BoxFuture, InitHandler, Plugin, PluginManager, PluginResult, ShutdownHandler,
};
use tracing::info;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "echo";

/// Records and logs lifecycle events.
#[derive(Debug, Default)]
pub struct EchoPlugin {
    seen: Mutex<Vec<String>>,
    shutdowns: AtomicUsize,
}

impl EchoPlugin {
    /// Names of plugins loaded after this one, in load order.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times shutdown has been signalled.
    #[must_use]
    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn as_init_handler(self: Arc<Self>) -> Option<Arc<dyn InitHandler>> {
        Some(self)
    }

    fn as_shutdown_handler(self: Arc<Self>) -> Option<Arc<dyn ShutdownHandler>> {
        Some(self)
    }
}

#[async_trait]
impl InitHandler for EchoPlugin {
    async fn handle_plugin_init(&self, plugin: Arc<dyn Plugin>) {
        info!(plugin = %plugin.name(), "echo: plugin loaded");
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(plugin.name().to_owned());
    }
}

#[async_trait]
impl ShutdownHandler for EchoPlugin {
    async fn handle_shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        info!(seen = self.seen().len(), "echo: shutting down");
    }
}

/// Factory exported to the host.
pub fn initialize(_manager: &PluginManager) -> BoxFuture<'_, PluginResult<Arc<dyn Plugin>>> {
    Box::pin(async {
        let plugin: Arc<dyn Plugin> = Arc::new(EchoPlugin::default());
        PluginResult::Ok(plugin)
    })
}

keystone_plugin::declare_plugin!(initialize);

#[cfg(test)]
mod tests {
    use super::*;

    struct Other;

    impl Plugin for Other {
        fn name(&self) -> &str {
            "other"
        }
    }

    #[tokio::test]
    async fn echoes_later_plugins_and_shutdown() {
        let manager = PluginManager::new();
        manager.register_fn(initialize);
        manager.register_fn(|_| {
            Box::pin(async {
                let plugin: Arc<dyn Plugin> = Arc::new(Other);
                PluginResult::Ok(plugin)
            })
        });

        assert!(manager.configure().await.is_empty());
        let echo = manager.lookup_as::<EchoPlugin>(PLUGIN_NAME).unwrap();
        assert_eq!(echo.seen(), vec!["other".to_owned()]);

        manager.shutdown().await;
        assert_eq!(echo.shutdowns(), 1);
    }

    #[test]
    fn exports_a_declaration() {
        assert_eq!(
            keystone_plugin_declaration.abi_version,
            keystone_plugin::dylib::ABI_VERSION
        );
    }
}
