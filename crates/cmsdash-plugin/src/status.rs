//! In-memory status table shared by the plugin manager and plugin APIs.
//!
//! The table is the single owner of [`PluginInstallation`] records. Every
//! write to a record that must survive a restart goes through the
//! [`PluginStore`]; a store failure is logged and reported as `false` while
//! the in-memory record keeps its new value.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, warn};

use cmsdash_core::events::{CmsEvent, PluginEvent};
use cmsdash_core::traits::PluginStore;
use cmsdash_core::types::{ConfigMap, PluginInstallation, PluginStatus, merge_config};

use crate::events::EventBus;

/// Installation records keyed by plugin id.
#[derive(Debug)]
pub struct StatusTable {
    /// Plugin id → record.
    records: RwLock<HashMap<String, PluginInstallation>>,
    /// Persistence collaborator.
    store: Arc<dyn PluginStore>,
    /// Bus used for `plugin:configUpdated`.
    events: EventBus,
}

impl StatusTable {
    /// Creates an empty table backed by `store`.
    pub fn new(store: Arc<dyn PluginStore>, events: EventBus) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            store,
            events,
        }
    }

    /// Returns the persistence collaborator.
    pub fn store(&self) -> &Arc<dyn PluginStore> {
        &self.store
    }

    /// Returns a copy of the record for `plugin_id`.
    pub async fn get(&self, plugin_id: &str) -> Option<PluginInstallation> {
        self.records.read().await.get(plugin_id).cloned()
    }

    /// Returns whether a record exists for `plugin_id`.
    pub async fn contains(&self, plugin_id: &str) -> bool {
        self.records.read().await.contains_key(plugin_id)
    }

    /// Returns the current status of `plugin_id`.
    pub async fn status_of(&self, plugin_id: &str) -> Option<PluginStatus> {
        self.records.read().await.get(plugin_id).map(|r| r.status)
    }

    /// Returns the ids of all records in `status`.
    pub async fn ids_with_status(&self, status: PluginStatus) -> HashSet<String> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.status == status)
            .map(|r| r.plugin_id.clone())
            .collect()
    }

    /// Returns all records ordered by install time, then id.
    pub async fn all(&self) -> Vec<PluginInstallation> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            a.installed_at
                .cmp(&b.installed_at)
                .then_with(|| a.plugin_id.cmp(&b.plugin_id))
        });
        records
    }

    /// Inserts `record` unless one already exists. Returns whether it was inserted.
    pub async fn insert(&self, record: PluginInstallation) -> bool {
        let mut records = self.records.write().await;
        if records.contains_key(&record.plugin_id) {
            return false;
        }
        records.insert(record.plugin_id.clone(), record);
        true
    }

    /// Removes the record for `plugin_id`.
    pub async fn remove(&self, plugin_id: &str) -> Option<PluginInstallation> {
        self.records.write().await.remove(plugin_id)
    }

    /// Moves `plugin_id` to `status`. Returns the previous status.
    pub async fn transition(&self, plugin_id: &str, status: PluginStatus) -> Option<PluginStatus> {
        let mut records = self.records.write().await;
        let record = records.get_mut(plugin_id)?;
        let previous = record.status;
        record.transition(status);
        Some(previous)
    }

    /// Moves `plugin_id` to `ERROR` with `message`. Returns the previous status.
    pub async fn fail(&self, plugin_id: &str, message: &str) -> Option<PluginStatus> {
        let mut records = self.records.write().await;
        let record = records.get_mut(plugin_id)?;
        let previous = record.status;
        record.fail(message);
        Some(previous)
    }

    /// Persists the active flag of `plugin_id`.
    pub async fn persist_active(&self, plugin_id: &str, is_active: bool) -> bool {
        match self.store.update_plugin_status(plugin_id, is_active).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(plugin_id = %plugin_id, "No persisted row to update status on");
                false
            }
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Failed to persist plugin status");
                false
            }
        }
    }

    /// Returns the configuration of `plugin_id`, or an empty map if untracked.
    pub async fn config_of(&self, plugin_id: &str) -> ConfigMap {
        self.records
            .read()
            .await
            .get(plugin_id)
            .map(|r| r.config.clone())
            .unwrap_or_default()
    }

    /// Shallow-merges `partial` into the configuration of `plugin_id`,
    /// persists the partial update and emits `plugin:configUpdated`.
    pub async fn merge_config(&self, plugin_id: &str, partial: ConfigMap) -> bool {
        let keys: Vec<String> = partial.keys().cloned().collect();
        let for_store = partial.clone();

        {
            let mut records = self.records.write().await;
            let Some(record) = records.get_mut(plugin_id) else {
                warn!(plugin_id = %plugin_id, "Config update for unknown plugin");
                return false;
            };
            merge_config(&mut record.config, partial);
            record.updated_at = Utc::now();
        }

        let persisted = match self.store.update_plugin_config(plugin_id, &for_store).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(plugin_id = %plugin_id, "No persisted row to update config on");
                false
            }
            Err(e) => {
                error!(plugin_id = %plugin_id, error = %e, "Failed to persist plugin config");
                false
            }
        };

        self.events.emit(&CmsEvent::from(PluginEvent::ConfigUpdated {
            plugin_id: plugin_id.to_string(),
            keys,
        }));
        persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPluginStore;
    use cmsdash_core::types::{PluginMetadata, StoredPlugin};
    use serde_json::json;

    async fn make_table() -> (StatusTable, Arc<MemoryPluginStore>) {
        let store = Arc::new(MemoryPluginStore::new());
        let table = StatusTable::new(store.clone(), EventBus::new());
        let record = PluginInstallation::new("seo");
        let row = StoredPlugin::from_installation(&PluginMetadata::new("seo", "SEO", "1.0.0"), &record);
        store.save_plugin(&row).await.unwrap();
        table.insert(record).await;
        (table, store)
    }

    #[tokio::test]
    async fn test_insert_does_not_overwrite() {
        let (table, _) = make_table().await;
        table.transition("seo", PluginStatus::Active).await;
        assert!(!table.insert(PluginInstallation::new("seo")).await);
        assert_eq!(table.status_of("seo").await, Some(PluginStatus::Active));
    }

    #[tokio::test]
    async fn test_fail_records_message_and_transition_clears_it() {
        let (table, _) = make_table().await;
        let previous = table.fail("seo", "boom").await;
        assert_eq!(previous, Some(PluginStatus::Installed));
        assert_eq!(table.get("seo").await.unwrap().error.as_deref(), Some("boom"));

        table.transition("seo", PluginStatus::Active).await;
        assert!(table.get("seo").await.unwrap().error.is_none());
    }

    #[tokio::test]
    async fn test_merge_config_is_shallow_and_persisted() {
        let (table, store) = make_table().await;

        let mut first = ConfigMap::new();
        first.insert("title".into(), json!("Shop"));
        first.insert("nested".into(), json!({"a": 1}));
        assert!(table.merge_config("seo", first).await);

        let mut second = ConfigMap::new();
        second.insert("nested".into(), json!({"b": 2}));
        assert!(table.merge_config("seo", second).await);

        let config = table.config_of("seo").await;
        assert_eq!(config["title"], json!("Shop"));
        assert_eq!(config["nested"], json!({"b": 2}));

        let row = store.get_plugin_by_id("seo").await.unwrap().unwrap();
        assert_eq!(row.config, config);
    }

    #[tokio::test]
    async fn test_merge_config_unknown_plugin() {
        let (table, _) = make_table().await;
        assert!(!table.merge_config("missing", ConfigMap::new()).await);
        assert!(table.config_of("missing").await.is_empty());
    }
}
