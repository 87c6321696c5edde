//! Plugin loader: resolves plugin ids against the [`PluginCatalog`] and
//! materializes or removes plugin assets through a [`PluginSource`].
//!
//! The loader never touches installation records. Every operation emits a
//! before/after pair on success or a before/error pair on failure, and
//! failures are reported as `None`/`false` rather than propagated.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use cmsdash_core::error::AppError;
use cmsdash_core::events::{CmsEvent, PluginEvent};
use cmsdash_core::result::AppResult;
use cmsdash_core::types::PluginMetadata;

use crate::catalog::PluginCatalog;
use crate::events::EventBus;
use crate::plugin::Plugin;
use crate::source::PluginSource;

/// Loads plugin code and manages plugin assets.
#[derive(Debug)]
pub struct PluginLoader {
    /// Available plugin implementations.
    catalog: PluginCatalog,
    /// Where plugin assets are materialized.
    source: Arc<dyn PluginSource>,
    /// Shared event bus.
    events: EventBus,
}

impl PluginLoader {
    /// Creates a loader.
    pub fn new(catalog: PluginCatalog, source: Arc<dyn PluginSource>, events: EventBus) -> Self {
        Self {
            catalog,
            source,
            events,
        }
    }

    /// Returns the catalog of available plugins.
    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Returns the plugin source.
    pub fn source(&self) -> &Arc<dyn PluginSource> {
        &self.source
    }

    /// Loads a fresh instance of `plugin_id`.
    ///
    /// Returns `None` if the id is not in the catalog, or the plugin declares
    /// invalid metadata or a different id.
    pub async fn load_plugin(&self, plugin_id: &str) -> Option<Arc<dyn Plugin>> {
        self.emit(PluginEvent::BeforeLoad {
            plugin_id: plugin_id.to_string(),
        });

        match self.instantiate(plugin_id) {
            Ok((plugin, metadata)) => {
                debug!(plugin_id = %plugin_id, version = %metadata.version, "Plugin loaded");
                self.emit(PluginEvent::AfterLoad {
                    plugin_id: plugin_id.to_string(),
                    version: metadata.version,
                });
                Some(plugin)
            }
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Failed to load plugin");
                self.emit(PluginEvent::LoadError {
                    plugin_id: plugin_id.to_string(),
                    error: e.message,
                });
                None
            }
        }
    }

    /// Materializes the assets of a catalog plugin.
    pub async fn install_from_marketplace(&self, plugin_id: &str) -> bool {
        self.emit(PluginEvent::BeforeInstall {
            plugin_id: plugin_id.to_string(),
        });

        let result = match self.instantiate(plugin_id) {
            Ok((_, metadata)) => self.source.acquire(&metadata).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(plugin_id = %plugin_id, "Plugin assets installed");
                self.emit(PluginEvent::AfterInstall {
                    plugin_id: plugin_id.to_string(),
                });
                true
            }
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Failed to install plugin assets");
                self.emit(PluginEvent::InstallError {
                    plugin_id: plugin_id.to_string(),
                    error: e.message,
                });
                false
            }
        }
    }

    /// Removes the assets of `plugin_id`.
    pub async fn uninstall_plugin(&self, plugin_id: &str) -> bool {
        self.emit(PluginEvent::BeforeUninstall {
            plugin_id: plugin_id.to_string(),
        });

        match self.source.release(plugin_id).await {
            Ok(()) => {
                info!(plugin_id = %plugin_id, "Plugin assets removed");
                self.emit(PluginEvent::AfterUninstall {
                    plugin_id: plugin_id.to_string(),
                });
                true
            }
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Failed to remove plugin assets");
                self.emit(PluginEvent::UninstallError {
                    plugin_id: plugin_id.to_string(),
                    error: e.message,
                });
                false
            }
        }
    }

    /// Returns metadata of every plugin whose assets are installed, sorted by id.
    pub async fn get_installed_plugins_metadata(&self) -> Vec<PluginMetadata> {
        match self.source.list().await {
            Ok(plugins) => plugins,
            Err(e) => {
                warn!(error = %e, "Failed to list installed plugins");
                Vec::new()
            }
        }
    }

    /// Returns whether the assets of `plugin_id` are installed.
    pub async fn is_installed(&self, plugin_id: &str) -> bool {
        self.source.contains(plugin_id).await.unwrap_or(false)
    }

    fn instantiate(&self, plugin_id: &str) -> AppResult<(Arc<dyn Plugin>, PluginMetadata)> {
        let factory = self.catalog.get(plugin_id).ok_or_else(|| {
            AppError::load(format!("Plugin '{plugin_id}' is not in the catalog"))
        })?;

        let plugin = factory();
        let metadata = plugin.metadata();
        metadata
            .validate()
            .map_err(|e| AppError::load(format!("Plugin '{plugin_id}' is invalid: {}", e.message)))?;

        if metadata.id != plugin_id {
            return Err(AppError::load(format!(
                "Plugin '{plugin_id}' declares mismatched id '{}'",
                metadata.id
            )));
        }
        Ok((plugin, metadata))
    }

    fn emit(&self, event: PluginEvent) {
        self.events.emit(&CmsEvent::from(event));
    }
}
