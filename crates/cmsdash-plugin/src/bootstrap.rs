//! CMS bootstrap: brings the plugin runtime up and down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use cmsdash_core::config::PluginConfig;
use cmsdash_core::error::AppError;
use cmsdash_core::events::{CmsEvent, SystemEvent};
use cmsdash_core::result::AppResult;
use cmsdash_core::types::PluginMetadata;

use crate::dependency;
use crate::events::EventBus;
use crate::loader::PluginLoader;
use crate::manager::PluginManager;

/// Top-level lifecycle of the plugin runtime.
#[derive(Debug)]
pub struct CmsCore {
    manager: Arc<PluginManager>,
    loader: Arc<PluginLoader>,
    events: EventBus,
    config: PluginConfig,
    initialized: AtomicBool,
    /// Serializes `initialize` and `shutdown`.
    lifecycle: Mutex<()>,
}

impl CmsCore {
    /// Creates the bootstrap around an existing manager and loader.
    pub fn new(
        manager: Arc<PluginManager>,
        loader: Arc<PluginLoader>,
        events: EventBus,
        config: PluginConfig,
    ) -> Self {
        Self {
            manager,
            loader,
            events,
            config,
            initialized: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
        }
    }

    /// Restores persisted plugins and brings up the configured core plugins.
    ///
    /// A second call logs a warning and does nothing. Fails only if a
    /// configured core plugin is not in the catalog.
    pub async fn initialize(&self) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;
        if self.initialized.load(Ordering::SeqCst) {
            warn!("CMS already initialized");
            return Ok(());
        }

        let core = self.core_plugins()?;

        info!(core_plugins = core.len(), "Initializing CMS");
        self.emit(SystemEvent::BeforeInit);

        if self.config.auto_load {
            self.manager.initialize().await;
        } else {
            self.manager.restore_statuses().await;
        }

        for plugin_id in dependency::activation_order(&core) {
            self.load_core_plugin(&plugin_id, &core).await;
        }

        self.initialized.store(true, Ordering::SeqCst);

        let active_plugins = self.manager.active_count().await;
        info!(active_plugins = active_plugins, "CMS initialized");
        self.emit(SystemEvent::AfterInit { active_plugins });
        Ok(())
    }

    /// Materializes the assets of a catalog plugin.
    pub async fn install_plugin(&self, plugin_id: &str) -> bool {
        self.loader.install_from_marketplace(plugin_id).await
    }

    /// Removes the assets of a plugin.
    pub async fn uninstall_plugin(&self, plugin_id: &str) -> bool {
        self.loader.uninstall_plugin(plugin_id).await
    }

    /// Whether [`initialize`](Self::initialize) has completed and
    /// [`shutdown`](Self::shutdown) has not run since.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Deactivates every plugin and emits `cms:shutdown`.
    pub async fn shutdown(&self) {
        let _guard = self.lifecycle.lock().await;
        info!("Shutting down CMS");
        self.manager.deactivate_all().await;
        self.emit(SystemEvent::Shutdown);
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// The plugin manager.
    pub fn manager(&self) -> &Arc<PluginManager> {
        &self.manager
    }

    fn core_plugins(&self) -> AppResult<Vec<PluginMetadata>> {
        self.config
            .core
            .iter()
            .map(|id| {
                self.loader.catalog().metadata(id).ok_or_else(|| {
                    AppError::configuration(format!("Core plugin '{id}' is not in the catalog"))
                })
            })
            .collect()
    }

    async fn load_core_plugin(&self, plugin_id: &str, core: &[PluginMetadata]) {
        if !self.manager.is_installed(plugin_id).await {
            let Some(metadata) = core.iter().find(|m| m.id == plugin_id).cloned() else {
                return;
            };
            if !self.manager.install_plugin(plugin_id, metadata).await {
                error!(plugin_id = %plugin_id, "Failed to install core plugin");
                return;
            }
        }
        if !self.manager.activate_plugin(plugin_id).await {
            error!(plugin_id = %plugin_id, "Failed to activate core plugin");
        }
    }

    fn emit(&self, event: SystemEvent) {
        self.events.emit(&CmsEvent::from(event));
    }
}
