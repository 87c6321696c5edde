//! Plugin manager: the lifecycle state machine for installed plugins.
//!
//! ```text
//!  install ──► INSTALLED ──activate──► ACTIVE ──deactivate──► INACTIVE
//!                  │                     ▲                        │
//!                  └──activate fails──► ERROR ◄──activate fails───┘
//! ```
//!
//! Lifecycle operations on the same plugin id are serialized through a
//! per-id async mutex; operations on different ids run concurrently. The
//! dependency checks of activation and deactivation go through one shared
//! gate that also tracks plugins mid-`initialize` and mid-cleanup, so a
//! dependent can never end up `ACTIVE` while its dependency is not.
//! Failures never propagate: they are logged, reflected in the status
//! record and reported as `false`.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, warn};

use cmsdash_core::error::AppError;
use cmsdash_core::events::{CmsEvent, PluginEvent};
use cmsdash_core::result::AppResult;
use cmsdash_core::traits::PluginStore;
use cmsdash_core::types::{
    ConfigMap, PluginInstallation, PluginMetadata, PluginStatus, StoredPlugin,
};

use crate::api::PluginApi;
use crate::dependency;
use crate::events::EventBus;
use crate::loader::PluginLoader;
use crate::plugin::{CleanupFn, Plugin};
use crate::registry::ExtensionRegistry;
use crate::status::StatusTable;

/// A plugin that completed `initialize` and is currently `ACTIVE`.
struct LoadedPlugin {
    /// The live instance.
    plugin: Arc<dyn Plugin>,
    /// Metadata declared by the instance.
    metadata: PluginMetadata,
    /// The API handed to `initialize`.
    api: Arc<PluginApi>,
    /// Closure returned by `initialize`, if any.
    cleanup: Option<CleanupFn>,
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("plugin_id", &self.metadata.id)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Activations and deactivations past their dependency check.
#[derive(Debug, Default)]
struct InFlight {
    /// Plugins whose `initialize` is running, with their metadata.
    starting: HashMap<String, PluginMetadata>,
    /// Plugins being torn down while still recorded as `ACTIVE`.
    stopping: HashSet<String>,
}

/// Owns installation records and drives plugin lifecycle transitions.
#[derive(Debug)]
pub struct PluginManager {
    /// Code loader.
    loader: Arc<PluginLoader>,
    /// Extension registry shared with plugin APIs.
    registry: Arc<ExtensionRegistry>,
    /// Shared event bus.
    events: EventBus,
    /// Installation records.
    status: Arc<StatusTable>,
    /// Known metadata of installed plugins.
    metadata: RwLock<HashMap<String, PluginMetadata>>,
    /// Active plugin instances.
    loaded: RwLock<HashMap<String, LoadedPlugin>>,
    /// Per-plugin lifecycle locks.
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// Dependency gate shared by all plugin ids.
    in_flight: Mutex<InFlight>,
    /// Root for plugin-private storage directories.
    storage_root: String,
}

impl PluginManager {
    /// Creates a manager.
    pub fn new(
        loader: Arc<PluginLoader>,
        registry: Arc<ExtensionRegistry>,
        events: EventBus,
        store: Arc<dyn PluginStore>,
        storage_root: impl Into<String>,
    ) -> Self {
        let status = Arc::new(StatusTable::new(store, events.clone()));
        Self {
            loader,
            registry,
            events,
            status,
            metadata: RwLock::new(HashMap::new()),
            loaded: RwLock::new(HashMap::new()),
            locks: DashMap::new(),
            in_flight: Mutex::new(InFlight::default()),
            storage_root: storage_root.into(),
        }
    }

    /// Restores persisted records and re-activates plugins that were active.
    ///
    /// Returns the number of plugins re-activated.
    pub async fn initialize(&self) -> usize {
        let to_activate = self.restore_statuses().await;
        let order = dependency::activation_order(&to_activate);

        let mut activated = 0;
        for plugin_id in &order {
            if self.activate_plugin(plugin_id).await {
                activated += 1;
            } else {
                warn!(plugin_id = %plugin_id, "Failed to re-activate plugin");
            }
        }

        info!(
            restored = order.len(),
            activated = activated,
            "Plugin manager initialized"
        );
        activated
    }

    /// Loads persisted rows into the status table without activating anything.
    ///
    /// Rows persisted as active come back `INACTIVE`. Returns the metadata of
    /// those plugins. Ids that are already tracked are left untouched.
    pub async fn restore_statuses(&self) -> Vec<PluginMetadata> {
        let rows = match self.status.store().get_all_plugins().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Failed to read persisted plugins");
                return Vec::new();
            }
        };

        let installed: HashMap<String, PluginMetadata> = self
            .loader
            .get_installed_plugins_metadata()
            .await
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();

        let mut was_active = Vec::new();
        for row in rows {
            if !self.status.insert(PluginInstallation::from_stored(&row)).await {
                debug!(plugin_id = %row.id, "Plugin already tracked, skipping restore");
                continue;
            }

            let metadata = installed
                .get(&row.id)
                .cloned()
                .or_else(|| self.loader.catalog().metadata(&row.id))
                .unwrap_or_else(|| metadata_from_row(&row));

            if row.is_active {
                was_active.push(metadata.clone());
            }
            self.metadata.write().await.insert(row.id.clone(), metadata);
        }
        was_active
    }

    /// Creates an installation record for `plugin_id` and materializes its assets.
    pub async fn install_plugin(&self, plugin_id: &str, metadata: PluginMetadata) -> bool {
        let _guard = self.lock_plugin(plugin_id).await;

        if self.status.contains(plugin_id).await {
            let err = AppError::conflict(format!("Plugin '{plugin_id}' is already installed"));
            warn!(plugin_id = %plugin_id, error = %err, "Install refused");
            return false;
        }
        if metadata.id != plugin_id {
            warn!(
                plugin_id = %plugin_id,
                declared = %metadata.id,
                "Metadata id does not match plugin id"
            );
            return false;
        }
        if let Err(e) = metadata.validate() {
            warn!(plugin_id = %plugin_id, error = %e, "Invalid plugin metadata");
            return false;
        }

        if !self.loader.install_from_marketplace(plugin_id).await {
            return false;
        }

        let record = PluginInstallation::new(plugin_id);
        let row = StoredPlugin::from_installation(&metadata, &record);
        if let Err(e) = self.status.store().save_plugin(&row).await {
            error!(plugin_id = %plugin_id, error = %e, "Failed to persist plugin installation");
            self.loader.uninstall_plugin(plugin_id).await;
            return false;
        }

        self.status.insert(record).await;
        self.metadata
            .write()
            .await
            .insert(plugin_id.to_string(), metadata.clone());

        info!(plugin_id = %plugin_id, version = %metadata.version, "Plugin installed");
        self.emit_status(plugin_id, None, Some(PluginStatus::Installed));
        self.emit(PluginEvent::Installed {
            plugin_id: plugin_id.to_string(),
            version: metadata.version,
        });
        true
    }

    /// Activates `plugin_id`. Returns `true` if the plugin ends up `ACTIVE`
    /// and the new state was persisted.
    pub async fn activate_plugin(&self, plugin_id: &str) -> bool {
        let _guard = self.lock_plugin(plugin_id).await;
        self.activate_locked(plugin_id).await
    }

    /// Deactivates `plugin_id`. A plugin that is not `ACTIVE` is left alone
    /// and reported as success.
    pub async fn deactivate_plugin(&self, plugin_id: &str) -> bool {
        let _guard = self.lock_plugin(plugin_id).await;
        self.deactivate_locked(plugin_id).await
    }

    /// Deactivates if needed, removes assets and forgets the plugin.
    pub async fn uninstall_plugin(&self, plugin_id: &str) -> bool {
        let _guard = self.lock_plugin(plugin_id).await;

        let Some(record) = self.status.get(plugin_id).await else {
            warn!(plugin_id = %plugin_id, "Cannot uninstall unknown plugin");
            return false;
        };

        if record.status == PluginStatus::Active && !self.deactivate_locked(plugin_id).await {
            warn!(plugin_id = %plugin_id, "Uninstall aborted: deactivation failed");
            return false;
        }

        if !self.loader.uninstall_plugin(plugin_id).await {
            return false;
        }

        let previous = self
            .status
            .remove(plugin_id)
            .await
            .map(|r| r.status);
        self.metadata.write().await.remove(plugin_id);

        let persisted = match self.status.store().delete_plugin(plugin_id).await {
            Ok(_) => true,
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Failed to delete persisted plugin");
                false
            }
        };

        info!(plugin_id = %plugin_id, "Plugin uninstalled");
        self.emit_status(plugin_id, previous, None);
        self.emit(PluginEvent::Uninstalled {
            plugin_id: plugin_id.to_string(),
        });
        persisted
    }

    /// Deactivates every active plugin, dependents first.
    pub async fn deactivate_all(&self) {
        let active: Vec<PluginMetadata> = self
            .loaded
            .read()
            .await
            .values()
            .map(|lp| lp.metadata.clone())
            .collect();

        let mut order = dependency::activation_order(&active);
        order.reverse();

        for plugin_id in &order {
            if !self.deactivate_plugin(plugin_id).await {
                error!(plugin_id = %plugin_id, "Error deactivating plugin");
            }
        }
        info!(count = order.len(), "All plugins deactivated");
    }

    /// Returns the record for `plugin_id`, or a fresh `INSTALLED` record if
    /// the id is unknown. Unknown ids are not tracked as a side effect.
    pub async fn get_plugin_status(&self, plugin_id: &str) -> PluginInstallation {
        self.status
            .get(plugin_id)
            .await
            .unwrap_or_else(|| PluginInstallation::new(plugin_id))
    }

    /// Returns every tracked record ordered by install time.
    pub async fn get_installed_plugins(&self) -> Vec<PluginInstallation> {
        self.status.all().await
    }

    /// Returns the known metadata of `plugin_id`.
    pub async fn get_plugin_metadata(&self, plugin_id: &str) -> Option<PluginMetadata> {
        self.metadata.read().await.get(plugin_id).cloned()
    }

    /// Returns whether `plugin_id` is tracked.
    pub async fn is_installed(&self, plugin_id: &str) -> bool {
        self.status.contains(plugin_id).await
    }

    /// Returns whether `plugin_id` is `ACTIVE`.
    pub async fn is_active(&self, plugin_id: &str) -> bool {
        self.status.status_of(plugin_id).await == Some(PluginStatus::Active)
    }

    /// Number of `ACTIVE` plugins.
    pub async fn active_count(&self) -> usize {
        self.status.ids_with_status(PluginStatus::Active).await.len()
    }

    /// Shallow-merges `partial` into the configuration of `plugin_id`.
    pub async fn update_plugin_config(&self, plugin_id: &str, partial: ConfigMap) -> bool {
        self.status.merge_config(plugin_id, partial).await
    }

    /// Creates an API bound to `plugin_id`.
    pub fn create_plugin_api(&self, plugin_id: &str) -> Arc<PluginApi> {
        Arc::new(PluginApi::new(
            plugin_id,
            Arc::clone(&self.registry),
            self.events.clone(),
            Arc::clone(&self.status),
            self.storage_root.clone(),
        ))
    }

    /// Returns the loader.
    pub fn loader(&self) -> &Arc<PluginLoader> {
        &self.loader
    }

    async fn activate_locked(&self, plugin_id: &str) -> bool {
        let Some(record) = self.status.get(plugin_id).await else {
            warn!(plugin_id = %plugin_id, "Cannot activate plugin that is not installed");
            return false;
        };
        if record.status == PluginStatus::Active {
            debug!(plugin_id = %plugin_id, "Plugin already active");
            return true;
        }

        self.emit(PluginEvent::BeforeActivate {
            plugin_id: plugin_id.to_string(),
        });

        match self.start_plugin(plugin_id).await {
            Ok(metadata) => {
                let previous = self.status.transition(plugin_id, PluginStatus::Active).await;
                info!(
                    plugin_id = %plugin_id,
                    name = %metadata.name,
                    version = %metadata.version,
                    "Plugin activated"
                );
                self.emit_status(plugin_id, previous, Some(PluginStatus::Active));
                self.emit(PluginEvent::AfterActivate {
                    plugin_id: plugin_id.to_string(),
                });
                self.status.persist_active(plugin_id, true).await
            }
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Plugin activation failed");
                let previous = self.status.fail(plugin_id, &e.message).await;
                self.status.persist_active(plugin_id, false).await;
                self.emit_status(plugin_id, previous, Some(PluginStatus::Error));
                self.emit(PluginEvent::ActivationFailed {
                    plugin_id: plugin_id.to_string(),
                    error: e.message,
                });
                false
            }
        }
    }

    async fn start_plugin(&self, plugin_id: &str) -> AppResult<PluginMetadata> {
        let plugin = self
            .loader
            .load_plugin(plugin_id)
            .await
            .ok_or_else(|| AppError::load(format!("Plugin '{plugin_id}' could not be loaded")))?;
        let metadata = plugin.metadata();

        self.reserve_start(&metadata).await?;
        let result = self.run_initialize(plugin, &metadata).await;
        self.in_flight.lock().await.starting.remove(plugin_id);

        result.map(|()| metadata)
    }

    /// Checks dependencies and marks the plugin as starting, atomically with
    /// respect to [`reserve_stop`](Self::reserve_stop).
    async fn reserve_start(&self, metadata: &PluginMetadata) -> AppResult<()> {
        let mut in_flight = self.in_flight.lock().await;

        let mut active = self.status.ids_with_status(PluginStatus::Active).await;
        active.retain(|id| !in_flight.stopping.contains(id));
        dependency::check_dependencies(metadata, &active)?;

        in_flight
            .starting
            .insert(metadata.id.clone(), metadata.clone());
        Ok(())
    }

    async fn run_initialize(
        &self,
        plugin: Arc<dyn Plugin>,
        metadata: &PluginMetadata,
    ) -> AppResult<()> {
        let plugin_id = metadata.id.as_str();
        let api = self.create_plugin_api(plugin_id);
        let cleanup = match guarded(plugin.initialize(Arc::clone(&api))).await {
            Ok(cleanup) => cleanup,
            Err(e) => {
                api.dispose();
                self.registry.remove_plugin_contributions(plugin_id).await;
                return Err(AppError::initialization(format!(
                    "Plugin '{plugin_id}' failed to initialize: {}",
                    e.message
                )));
            }
        };

        self.metadata
            .write()
            .await
            .insert(plugin_id.to_string(), metadata.clone());
        self.loaded.write().await.insert(
            plugin_id.to_string(),
            LoadedPlugin {
                plugin,
                metadata: metadata.clone(),
                api,
                cleanup,
            },
        );
        Ok(())
    }

    async fn deactivate_locked(&self, plugin_id: &str) -> bool {
        let Some(record) = self.status.get(plugin_id).await else {
            warn!(plugin_id = %plugin_id, "Cannot deactivate plugin that is not installed");
            return false;
        };
        if record.status != PluginStatus::Active {
            debug!(plugin_id = %plugin_id, status = %record.status, "Plugin not active");
            return true;
        }

        let dependents = self.reserve_stop(plugin_id).await;
        if !dependents.is_empty() {
            let err = AppError::dependency(format!(
                "Plugin '{plugin_id}' is required by active plugins: {}",
                dependents.join(", ")
            ));
            warn!(plugin_id = %plugin_id, error = %err, "Deactivation refused");
            return false;
        }

        self.emit(PluginEvent::BeforeDeactivate {
            plugin_id: plugin_id.to_string(),
        });

        self.stop_plugin(plugin_id).await;

        let previous = self
            .status
            .transition(plugin_id, PluginStatus::Inactive)
            .await;
        self.in_flight.lock().await.stopping.remove(plugin_id);
        info!(plugin_id = %plugin_id, "Plugin deactivated");
        self.emit_status(plugin_id, previous, Some(PluginStatus::Inactive));
        self.emit(PluginEvent::AfterDeactivate {
            plugin_id: plugin_id.to_string(),
        });
        self.status.persist_active(plugin_id, false).await
    }

    /// Returns the active or starting plugins that depend on `plugin_id`.
    /// When there are none, marks `plugin_id` as stopping.
    async fn reserve_stop(&self, plugin_id: &str) -> Vec<String> {
        let mut in_flight = self.in_flight.lock().await;

        let mut dependents = {
            let loaded = self.loaded.read().await;
            dependency::dependents_of(
                plugin_id,
                loaded
                    .values()
                    .map(|lp| &lp.metadata)
                    .chain(in_flight.starting.values()),
            )
        };
        dependents.dedup();

        if dependents.is_empty() {
            in_flight.stopping.insert(plugin_id.to_string());
        }
        dependents
    }

    async fn stop_plugin(&self, plugin_id: &str) {
        let Some(loaded) = self.loaded.write().await.remove(plugin_id) else {
            self.registry.remove_plugin_contributions(plugin_id).await;
            return;
        };

        if let Some(cleanup) = loaded.cleanup {
            if let Err(e) = guarded(cleanup()).await {
                warn!(plugin_id = %plugin_id, error = %e, "Plugin cleanup closure returned error");
            }
        }
        if let Err(e) = guarded(loaded.plugin.cleanup()).await {
            warn!(plugin_id = %plugin_id, error = %e, "Plugin cleanup returned error");
        }

        loaded.api.dispose();
        self.registry.remove_plugin_contributions(plugin_id).await;
    }

    async fn lock_plugin(&self, plugin_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let entry = self
                .locks
                .entry(plugin_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        lock.lock_owned().await
    }

    fn emit(&self, event: PluginEvent) {
        self.events.emit(&CmsEvent::from(event));
    }

    fn emit_status(&self, plugin_id: &str, from: Option<PluginStatus>, to: Option<PluginStatus>) {
        self.emit(PluginEvent::StatusChanged {
            plugin_id: plugin_id.to_string(),
            from,
            to,
        });
    }
}

/// Runs plugin code, turning a panic into an error.
async fn guarded<T, F>(fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(AppError::plugin("plugin code panicked")),
    }
}

fn metadata_from_row(row: &StoredPlugin) -> PluginMetadata {
    PluginMetadata::new(&row.id, &row.name, &row.version)
        .with_description(&row.description)
        .with_author(&row.author)
}
