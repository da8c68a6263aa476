//! Plugin manager.
//!
//! Owns every piece of lifecycle state: the queue of pending initializers,
//! the loaded plugins keyed by name, and the init/shutdown listener lists.
//! All of it sits behind one [`RwLock`] which is never held while plugin
//! code runs, so plugins are free to call back into the manager from their
//! constructors and handlers.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::dylib;
use crate::error::{PluginError, PluginResult};
use crate::initializer::{Initializer, InitializerFn};
use crate::plugin::{InitHandler, Plugin, ShutdownHandler};

#[derive(Default)]
struct ManagerState {
    pending: Vec<Box<dyn Initializer>>,
    loaded: HashMap<String, Arc<dyn Plugin>>,
    on_init: Vec<Arc<dyn InitHandler>>,
    on_shutdown: Vec<Arc<dyn ShutdownHandler>>,
}

/// Registry and lifecycle driver for plugins.
///
/// Create one per host process and share it (typically behind an [`Arc`]).
/// Plugins receive a `&PluginManager` while they are constructed and use it
/// to find the plugins they depend on.
#[derive(Default)]
pub struct PluginManager {
    state: RwLock<ManagerState>,
}

impl PluginManager {
    /// Create a manager with nothing pending or loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with one file-backed initializer queued per path.
    ///
    /// Nothing is opened until [`configure`](Self::configure) runs.
    #[must_use]
    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let manager = Self::new();
        for path in paths {
            manager.register(dylib::from_file(path));
        }
        manager
    }

    fn read(&self) -> RwLockReadGuard<'_, ManagerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ManagerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an initializer for the next [`configure`](Self::configure).
    pub fn register<I>(&self, initializer: I)
    where
        I: Initializer + 'static,
    {
        let mut state = self.write();
        state.pending.push(Box::new(initializer));
        debug!(pending = state.pending.len(), "Registered plugin initializer");
    }

    /// Queue a bare factory function for the next [`configure`](Self::configure).
    pub fn register_fn<F>(&self, factory: F)
    where
        F: for<'a> FnOnce(&'a PluginManager) -> BoxFuture<'a, PluginResult<Arc<dyn Plugin>>>
            + Send
            + Sync
            + 'static,
    {
        self.register(InitializerFn::new(factory));
    }

    /// Add a listener for plugins loaded from now on.
    pub fn on_plugin_init(&self, handler: Arc<dyn InitHandler>) {
        self.write().on_init.push(handler);
    }

    /// Add a listener for [`shutdown`](Self::shutdown).
    pub fn on_shutdown(&self, handler: Arc<dyn ShutdownHandler>) {
        self.write().on_shutdown.push(handler);
    }

    /// Look up a loaded plugin by name.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] if no plugin with that name is loaded.
    pub fn lookup(&self, name: &str) -> PluginResult<Arc<dyn Plugin>> {
        self.read()
            .loaded
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotFound(name.to_owned()))
    }

    /// Look up a loaded plugin and downcast it to its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] if nothing is loaded under `name`,
    /// or [`PluginError::TypeMismatch`] if the plugin is not a `T`.
    pub fn lookup_as<T>(&self, name: &str) -> PluginResult<Arc<T>>
    where
        T: Plugin,
    {
        let plugin: Arc<dyn Any + Send + Sync> = self.lookup(name)?;
        plugin
            .downcast::<T>()
            .map_err(|_| PluginError::TypeMismatch {
                name: name.to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Names of all loaded plugins, sorted.
    #[must_use]
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().loaded.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of initializers waiting for the next configure.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.read().pending.len()
    }

    /// Run every pending initializer once, in registration order.
    ///
    /// Initializers registered while this runs are left for the next call.
    /// A failure never stops the batch, and neither does a panicking
    /// initializer, which is reported as [`PluginError::Panicked`]. Every
    /// failure is returned and the caller decides which ones are fatal.
    pub async fn configure(&self) -> Vec<PluginError> {
        let mut errors = Vec::new();
        let batch = std::mem::take(&mut self.write().pending);
        if batch.is_empty() {
            return errors;
        }
        debug!(count = batch.len(), "Configuring plugins");

        for initializer in batch {
            // Fresh per plugin: handlers added by the previous plugin must
            // see the ones that follow it.
            let handlers = self.read().on_init.clone();

            let constructed = AssertUnwindSafe(initializer.initialize(self))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(PluginError::Panicked(panic_message(&*payload))));
            let plugin = match constructed {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!(error = %e, "Plugin init failed");
                    errors.push(PluginError::InitFailed(Box::new(e)));
                    continue;
                },
            };

            let name = plugin.name().to_owned();
            let init_handler = Arc::clone(&plugin).as_init_handler();
            let shutdown_handler = Arc::clone(&plugin).as_shutdown_handler();

            let inserted = {
                let mut state = self.write();
                match state.loaded.entry(name.clone()) {
                    Entry::Occupied(_) => false,
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::clone(&plugin));
                        if let Some(handler) = init_handler {
                            state.on_init.push(handler);
                        }
                        if let Some(handler) = shutdown_handler {
                            state.on_shutdown.push(handler);
                        }
                        true
                    },
                }
            };
            if !inserted {
                warn!(plugin = %name, "Plugin already loaded, discarding new instance");
                errors.push(PluginError::AlreadyLoaded(name));
                continue;
            }
            info!(plugin = %name, "Loaded plugin");

            for handler in handlers {
                let notified = AssertUnwindSafe(handler.handle_plugin_init(Arc::clone(&plugin)))
                    .catch_unwind()
                    .await;
                if notified.is_err() {
                    warn!(plugin = %name, "Plugin init handler panicked");
                }
            }
        }

        errors
    }

    /// Notify every shutdown listener and wait for all of them to finish.
    ///
    /// Each listener runs on its own task. There is no timeout, and calling
    /// this again notifies every listener again.
    pub async fn shutdown(&self) {
        let handlers = self.read().on_shutdown.clone();
        info!(listeners = handlers.len(), "Shutting down plugins");

        let tasks = handlers.into_iter().map(|handler| {
            tokio::spawn(async move {
                handler.handle_shutdown().await;
            })
        });
        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "Shutdown handler failed");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("PluginManager")
            .field("pending", &state.pending.len())
            .field("loaded", &state.loaded.len())
            .field("on_init", &state.on_init.len())
            .field("on_shutdown", &state.on_shutdown.len())
            .finish()
    }
}
