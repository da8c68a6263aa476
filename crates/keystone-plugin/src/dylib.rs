//! Loading plugins from shared libraries.
//!
//! A plugin library exports one static [`PluginDeclaration`] under the
//! symbol [`DECLARATION_SYMBOL`], normally via [`declare_plugin!`]. The
//! declaration carries the ABI version and the `keystone-plugin` version the
//! library was built against; both must match the host exactly, since plugin
//! trait objects cross the library boundary with the Rust ABI.
//!
//! Libraries are opened lazily, when the initializer returned by
//! [`from_file`] runs, and are never unloaded.
//!
//! A library links its own copy of `tracing`, whose global dispatcher is
//! separate from the host's. Before the factory runs, the host hands its
//! current dispatcher to the library so plugin events reach the host's
//! subscriber.
//!
//! [`declare_plugin!`]: crate::declare_plugin

#![allow(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use libloading::Library;
use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::initializer::Initializer;
use crate::manager::PluginManager;
use crate::plugin::Plugin;

/// Version of the declaration layout. Bumped on any incompatible change.
pub const ABI_VERSION: u32 = 1;

/// Version of `keystone-plugin` the host was built with.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the exported declaration static.
pub const DECLARATION_SYMBOL: &str = "keystone_plugin_declaration";

/// Factory signature every plugin library exports.
pub type InitializeFn =
    for<'a> fn(&'a PluginManager) -> BoxFuture<'a, PluginResult<Arc<dyn Plugin>>>;

/// Installs the host's dispatcher as the library's global default.
pub type SetDispatchFn = fn(tracing::Dispatch);

/// The static a plugin library exports to describe itself.
pub struct PluginDeclaration {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u32,
    /// Must equal [`CORE_VERSION`].
    pub core_version: &'static str,
    /// Forwards the library's `tracing` events to the host.
    pub set_dispatch: SetDispatchFn,
    /// Constructs the plugin.
    pub initialize: InitializeFn,
}

/// Default [`PluginDeclaration::set_dispatch`]: make `dispatch` the global
/// default of the `tracing` copy this function is compiled into.
///
/// Does nothing if that copy already has a global default, which is the
/// case when the plugin is linked into the host rather than loaded.
pub fn install_dispatch(dispatch: tracing::Dispatch) {
    if tracing::dispatcher::set_global_default(dispatch).is_err() {
        tracing::debug!("Plugin already has a global dispatcher");
    }
}

impl std::fmt::Debug for PluginDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDeclaration")
            .field("abi_version", &self.abi_version)
            .field("core_version", &self.core_version)
            .finish_non_exhaustive()
    }
}

/// Export a [`PluginDeclaration`] for the given factory function.
///
/// ```rust,ignore
/// fn initialize(manager: &PluginManager) -> BoxFuture<'_, PluginResult<Arc<dyn Plugin>>> {
///     Box::pin(async move {
///         let plugin: Arc<dyn Plugin> = Arc::new(MyPlugin);
///         PluginResult::Ok(plugin)
///     })
/// }
///
/// keystone_plugin::declare_plugin!(initialize);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($initialize:path) => {
        /// Plugin declaration read by the Keystone host when loading this library.
        #[allow(unsafe_code, non_upper_case_globals)]
        #[unsafe(no_mangle)]
        pub static keystone_plugin_declaration: $crate::dylib::PluginDeclaration =
            $crate::dylib::PluginDeclaration {
                abi_version: $crate::dylib::ABI_VERSION,
                core_version: $crate::dylib::CORE_VERSION,
                set_dispatch: $crate::dylib::install_dispatch,
                initialize: $initialize,
            };
    };
}

/// Initializer backed by a shared library on disk.
#[derive(Debug, Clone)]
pub struct DylibInitializer {
    path: PathBuf,
}

impl DylibInitializer {
    /// The library this initializer will open.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> PluginResult<InitializeFn> {
        // SAFETY: running a library's initialisers is inherent to loading
        // plugins; the host trusts the configured paths.
        let library =
            unsafe { Library::new(self.path.as_path()) }.map_err(|source| PluginError::Open {
                path: self.path.clone(),
                source,
            })?;

        // SAFETY: the symbol is declared by `declare_plugin!` as a
        // `PluginDeclaration` static; the versions are checked before use.
        let declaration: &PluginDeclaration = unsafe {
            let symbol = library
                .get::<*const PluginDeclaration>(DECLARATION_SYMBOL.as_bytes())
                .map_err(|source| PluginError::MissingSymbol {
                    path: self.path.clone(),
                    symbol: DECLARATION_SYMBOL,
                    source,
                })?;
            &**symbol
        };

        let initialize = check_declaration(&self.path, declaration)?;
        forward_dispatch(declaration);

        // The plugin's vtables, and any error it returns, live in the
        // library's mapping, so it stays loaded for the life of the process.
        std::mem::forget(library);
        Ok(initialize)
    }
}

/// Check `declaration` against the host's versions and return its factory.
///
/// # Errors
///
/// Returns [`PluginError::InvalidDeclaration`] if either version differs.
pub fn check_declaration(
    path: &Path,
    declaration: &PluginDeclaration,
) -> PluginResult<InitializeFn> {
    if declaration.abi_version != ABI_VERSION || declaration.core_version != CORE_VERSION {
        return Err(PluginError::InvalidDeclaration {
            path: path.to_path_buf(),
            expected_abi: ABI_VERSION,
            found_abi: declaration.abi_version,
            expected_core: CORE_VERSION.to_owned(),
            found_core: declaration.core_version.to_owned(),
        });
    }
    Ok(declaration.initialize)
}

/// Hand the host's current dispatcher to the library, unless the host has
/// no subscriber yet.
fn forward_dispatch(declaration: &PluginDeclaration) {
    let dispatch = tracing::dispatcher::get_default(Clone::clone);
    if dispatch.is::<tracing::subscriber::NoSubscriber>() {
        return;
    }
    (declaration.set_dispatch)(dispatch);
}

#[async_trait]
impl Initializer for DylibInitializer {
    async fn initialize(self: Box<Self>, manager: &PluginManager) -> PluginResult<Arc<dyn Plugin>> {
        debug!(path = %self.path.display(), "Opening plugin library");
        let initialize = self.open()?;
        initialize(manager)
            .await
            .map_err(|source| PluginError::Construction {
                path: self.path.clone(),
                source: Box::new(source),
            })
    }
}

/// An initializer that loads the plugin library at `path`.
#[must_use]
pub fn from_file(path: impl Into<PathBuf>) -> DylibInitializer {
    DylibInitializer { path: path.into() }
}
