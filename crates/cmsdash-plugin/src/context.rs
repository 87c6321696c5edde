//! Application context: wires the plugin runtime together from configuration.

use std::sync::Arc;

use cmsdash_core::config::{AppConfig, PluginSourceKind};
use cmsdash_core::traits::PluginStore;

use crate::bootstrap::CmsCore;
use crate::catalog::PluginCatalog;
use crate::events::EventBus;
use crate::loader::PluginLoader;
use crate::manager::PluginManager;
use crate::registry::ExtensionRegistry;
use crate::source::{DirectorySource, MemorySource, PluginSource};

/// Every runtime component, shared by reference.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Shared event bus.
    pub events: EventBus,
    /// Extension registry.
    pub registry: Arc<ExtensionRegistry>,
    /// Plugin loader.
    pub loader: Arc<PluginLoader>,
    /// Plugin manager.
    pub manager: Arc<PluginManager>,
    /// CMS bootstrap.
    pub cms: Arc<CmsCore>,
}

impl AppContext {
    /// Builds the runtime with an explicit plugin source.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn PluginStore>,
        source: Arc<dyn PluginSource>,
        catalog: PluginCatalog,
    ) -> Self {
        let events = EventBus::new();
        let registry = Arc::new(ExtensionRegistry::new());
        let loader = Arc::new(PluginLoader::new(catalog, source, events.clone()));
        let manager = Arc::new(PluginManager::new(
            Arc::clone(&loader),
            Arc::clone(&registry),
            events.clone(),
            store,
            config.plugins.storage_root.clone(),
        ));
        let cms = Arc::new(CmsCore::new(
            Arc::clone(&manager),
            Arc::clone(&loader),
            events.clone(),
            config.plugins.clone(),
        ));

        Self {
            config: Arc::new(config),
            events,
            registry,
            loader,
            manager,
            cms,
        }
    }

    /// Builds the runtime, choosing the plugin source from configuration.
    pub fn from_config(
        config: AppConfig,
        store: Arc<dyn PluginStore>,
        catalog: PluginCatalog,
    ) -> Self {
        let source: Arc<dyn PluginSource> = match config.plugins.source {
            PluginSourceKind::Memory => Arc::new(MemorySource::new()),
            PluginSourceKind::Directory => {
                Arc::new(DirectorySource::new(&config.plugins.directory))
            }
        };
        Self::new(config, store, source, catalog)
    }
}
