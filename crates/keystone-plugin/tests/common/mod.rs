//! Test plugins and initializers shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keystone_plugin::{
    InitHandler, Initializer, Plugin, PluginError, PluginManager, PluginResult, ShutdownHandler,
};

/// Plugin with nothing but a name.
#[derive(Debug)]
pub struct Named {
    pub name: String,
}

impl Plugin for Named {
    fn name(&self) -> &str {
        &self.name
    }
}

pub fn named(name: &str) -> Arc<dyn Plugin> {
    Arc::new(Named { name: name.into() })
}

/// Initializer that hands out a prebuilt plugin.
pub struct Ready(pub Arc<dyn Plugin>);

#[async_trait]
impl Initializer for Ready {
    async fn initialize(self: Box<Self>, _manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>> {
        Ok(self.0)
    }
}

pub fn ready(name: &str) -> Ready {
    Ready(named(name))
}

/// Initializer that always fails.
pub struct Failing(pub &'static str);

#[async_trait]
impl Initializer for Failing {
    async fn initialize(self: Box<Self>, _manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>> {
        Err(PluginError::initialization(self.0))
    }
}

/// Initializer that panics while constructing.
pub struct Exploding(pub &'static str);

#[async_trait]
impl Initializer for Exploding {
    async fn initialize(self: Box<Self>, _manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>> {
        panic!("{}", self.0);
    }
}

/// Initializer that runs a hook against the manager before producing its plugin.
pub struct WithHook<F> {
    pub plugin: Arc<dyn Plugin>,
    pub hook: F,
}

#[async_trait]
impl<F> Initializer for WithHook<F>
where
    F: FnOnce(&PluginManager) + Send + Sync,
{
    async fn initialize(self: Box<Self>, manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>> {
        let Self { plugin, hook } = *self;
        hook(manager);
        Ok(plugin)
    }
}

/// Records the names of plugins it is told about.
#[derive(Debug, Default)]
pub struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl InitHandler for Recorder {
    async fn handle_plugin_init(&self, plugin: Arc<dyn Plugin>) {
        self.seen.lock().unwrap().push(plugin.name().to_owned());
    }
}

/// Plugin that is both an init and a shutdown listener.
#[derive(Debug)]
pub struct Observer {
    pub name: String,
    pub recorder: Recorder,
    pub shutdowns: AtomicUsize,
}

impl Observer {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            recorder: Recorder::default(),
            shutdowns: AtomicUsize::new(0),
        })
    }
}

impl Plugin for Observer {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_init_handler(self: Arc<Self>) -> Option<Arc<dyn InitHandler>> {
        Some(self)
    }

    fn as_shutdown_handler(self: Arc<Self>) -> Option<Arc<dyn ShutdownHandler>> {
        Some(self)
    }
}

#[async_trait]
impl InitHandler for Observer {
    async fn handle_plugin_init(&self, plugin: Arc<dyn Plugin>) {
        self.recorder.handle_plugin_init(plugin).await;
    }
}

#[async_trait]
impl ShutdownHandler for Observer {
    async fn handle_shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shutdown listener that sleeps before reporting completion.
pub struct SlowStop {
    pub delay: Duration,
    pub completed: Arc<AtomicUsize>,
}

#[async_trait]
impl ShutdownHandler for SlowStop {
    async fn handle_shutdown(&self) {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Init listener that panics on every notification.
pub struct Panicky;

#[async_trait]
impl InitHandler for Panicky {
    async fn handle_plugin_init(&self, plugin: Arc<dyn Plugin>) {
        panic!("listener exploded on {}", plugin.name());
    }
}

#[async_trait]
impl ShutdownHandler for Panicky {
    async fn handle_shutdown(&self) {
        panic!("listener exploded during shutdown");
    }
}
