//! Plugin lifecycle manager for the Keystone extension host.
//!
//! Provides the core abstractions for extending a host process with plugins:
//!
//! - [`Plugin`]: A named extension, with optional [`InitHandler`] and
//!   [`ShutdownHandler`] capabilities
//! - [`Initializer`]: Deferred, single-use factory that constructs a plugin
//! - [`PluginManager`]: Queues initializers, loads plugins in batches,
//!   deduplicates by name and fans out lifecycle notifications
//! - [`dylib`]: Loading plugins from shared libraries
//!
//! # Lifecycle
//!
//! ```rust
//! use std::sync::Arc;
//! use keystone_plugin::{Plugin, PluginManager, PluginResult};
//!
//! struct Hello;
//!
//! impl Plugin for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = PluginManager::new();
//! manager.register_fn(|_| {
//!     Box::pin(async {
//!         let plugin: Arc<dyn Plugin> = Arc::new(Hello);
//!         PluginResult::Ok(plugin)
//!     })
//! });
//!
//! let errors = manager.configure().await;
//! assert!(errors.is_empty());
//! assert!(manager.lookup("hello").is_ok());
//!
//! manager.shutdown().await;
//! # }
//! ```
//!
//! # Re-entrancy
//!
//! The manager's lock is never held while plugin code runs. An initializer
//! may register more initializers or listeners; new initializers wait for
//! the next [`PluginManager::configure`] call, while new init listeners see
//! every plugin loaded after them in the current batch.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod dylib;
pub mod error;
pub mod initializer;
pub mod manager;
pub mod plugin;

pub use dylib::{DylibInitializer, PluginDeclaration, from_file};
pub use error::{PluginError, PluginResult};
pub use initializer::{Initializer, InitializerFn};
pub use manager::PluginManager;
pub use plugin::{InitHandler, Plugin, ShutdownHandler, announce};

/// Re-exported so plugin crates can name factory return types without
/// depending on `futures` themselves.
pub use futures::future::BoxFuture;
