//! Deferred plugin factories.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::PluginResult;
use crate::manager::PluginManager;
use crate::plugin::Plugin;

/// A single-use factory that constructs one plugin.
///
/// Initializers are queued with [`PluginManager::register`] and run by
/// [`PluginManager::configure`]. The manager is unlocked while an
/// initializer runs, so it may look up plugins loaded earlier and register
/// further listeners or initializers.
#[async_trait]
pub trait Initializer: Send + Sync {
    /// Construct the plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot be constructed. The failure is
    /// recorded by the batch and the initializer is not retried.
    async fn initialize(self: Box<Self>, manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>>;
}

/// Adapts a bare factory function into an [`Initializer`].
///
/// ```rust
/// use std::sync::Arc;
/// use keystone_plugin::{InitializerFn, Plugin, PluginManager, PluginResult};
///
/// struct Noop;
///
/// impl Plugin for Noop {
///     fn name(&self) -> &str {
///         "noop"
///     }
/// }
///
/// let manager = PluginManager::new();
/// manager.register(InitializerFn::new(|_manager: &PluginManager| {
///     Box::pin(async move {
///         let plugin: Arc<dyn Plugin> = Arc::new(Noop);
///         PluginResult::Ok(plugin)
///     })
/// }));
/// assert_eq!(manager.pending_len(), 1);
/// ```
pub struct InitializerFn<F>(F);

impl<F> InitializerFn<F>
where
    F: for<'a> FnOnce(&'a PluginManager) -> BoxFuture<'a, PluginResult<Arc<dyn Plugin>>>
        + Send
        + Sync,
{
    /// Wrap a factory function.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self(factory)
    }
}

#[async_trait]
impl<F> Initializer for InitializerFn<F>
where
    F: for<'a> FnOnce(&'a PluginManager) -> BoxFuture<'a, PluginResult<Arc<dyn Plugin>>>
        + Send
        + Sync,
{
    async fn initialize(self: Box<Self>, manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>> {
        (self.0)(manager).await
    }
}
