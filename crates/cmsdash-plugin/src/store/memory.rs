//! In-memory implementation of [`PluginStore`].

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use cmsdash_core::result::AppResult;
use cmsdash_core::traits::PluginStore;
use cmsdash_core::types::{ConfigMap, StoredPlugin, merge_config};

/// Process-local plugin table. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryPluginStore {
    rows: DashMap<String, StoredPlugin>,
}

impl MemoryPluginStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl PluginStore for MemoryPluginStore {
    async fn get_all_plugins(&self) -> AppResult<Vec<StoredPlugin>> {
        let mut rows: Vec<StoredPlugin> = self.rows.iter().map(|r| r.value().clone()).collect();
        rows.sort_by(|a, b| a.installed_at.cmp(&b.installed_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn get_plugin_by_id(&self, id: &str) -> AppResult<Option<StoredPlugin>> {
        Ok(self.rows.get(id).map(|r| r.value().clone()))
    }

    async fn save_plugin(&self, plugin: &StoredPlugin) -> AppResult<()> {
        self.rows.insert(plugin.id.clone(), plugin.clone());
        Ok(())
    }

    async fn update_plugin_status(&self, id: &str, is_active: bool) -> AppResult<bool> {
        Ok(match self.rows.get_mut(id) {
            Some(mut row) => {
                row.is_active = is_active;
                row.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_plugin_config(&self, id: &str, partial: &ConfigMap) -> AppResult<bool> {
        Ok(match self.rows.get_mut(id) {
            Some(mut row) => {
                merge_config(&mut row.config, partial.clone());
                row.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_plugin(&self, id: &str) -> AppResult<bool> {
        Ok(self.rows.remove(id).is_some())
    }
}
