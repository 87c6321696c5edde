//! Persistence collaborator for plugin installation rows.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::plugin::{ConfigMap, StoredPlugin};

/// Backing store for installed plugins.
///
/// The plugin manager treats every `Err` as a soft failure: it is logged and
/// the calling operation reports `false`.
#[async_trait]
pub trait PluginStore: Send + Sync + std::fmt::Debug + 'static {
    /// Returns every persisted plugin row.
    async fn get_all_plugins(&self) -> AppResult<Vec<StoredPlugin>>;

    /// Returns one row by plugin id.
    async fn get_plugin_by_id(&self, plugin_id: &str) -> AppResult<Option<StoredPlugin>>;

    /// Inserts or replaces a row.
    async fn save_plugin(&self, plugin: &StoredPlugin) -> AppResult<()>;

    /// Sets the active flag. Returns `false` when no row exists.
    async fn update_plugin_status(&self, plugin_id: &str, is_active: bool) -> AppResult<bool>;

    /// Shallow-merges `partial` into the stored config. Returns `false` when no row exists.
    async fn update_plugin_config(&self, plugin_id: &str, partial: &ConfigMap)
    -> AppResult<bool>;

    /// Deletes a row. Returns `true` if a row was removed.
    async fn delete_plugin(&self, plugin_id: &str) -> AppResult<bool>;
}
