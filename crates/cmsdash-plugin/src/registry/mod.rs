//! Extension registry: stores registered plugin metadata and every
//! contribution plugins make, for consumption by dashboard surfaces.
//!
//! All collections keep insertion order. Contributions are keyed by
//! `(plugin_id, id)`: registering the same id twice from one plugin replaces
//! the earlier entry in place.

pub mod contributions;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use cmsdash_core::types::PluginMetadata;

pub use contributions::{
    ContentType, Contribution, CustomRoute, EditorExtension, EditorSlot, MenuItem, SettingsPanel,
};

/// Counts of everything currently registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    /// Registered plugins.
    pub plugins: usize,
    /// Content types.
    pub content_types: usize,
    /// Menu items.
    pub menu_items: usize,
    /// Settings panels.
    pub settings_panels: usize,
    /// Editor extensions.
    pub editor_extensions: usize,
    /// Custom routes.
    pub routes: usize,
}

/// Global store of plugin contributions.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    /// Metadata registered through `PluginApi::register_plugin`.
    plugins: RwLock<Vec<PluginMetadata>>,
    /// Content types.
    content_types: RwLock<Vec<ContentType>>,
    /// Sidebar menu items.
    menu_items: RwLock<Vec<MenuItem>>,
    /// Settings panels.
    settings_panels: RwLock<Vec<SettingsPanel>>,
    /// Editor extensions.
    editor_extensions: RwLock<Vec<EditorExtension>>,
    /// Custom routes.
    routes: RwLock<Vec<CustomRoute>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers plugin metadata, replacing an earlier entry with the same id.
    pub async fn register_plugin(&self, metadata: PluginMetadata) {
        let mut plugins = self.plugins.write().await;
        match plugins.iter_mut().find(|p| p.id == metadata.id) {
            Some(existing) => *existing = metadata,
            None => plugins.push(metadata),
        }
    }

    /// Adds a content type owned by `plugin_id`.
    pub async fn add_content_type(&self, plugin_id: &str, content_type: ContentType) -> ContentType {
        upsert(&self.content_types, plugin_id, content_type).await
    }

    /// Adds a menu item owned by `plugin_id`.
    pub async fn add_menu_item(&self, plugin_id: &str, item: MenuItem) -> MenuItem {
        upsert(&self.menu_items, plugin_id, item).await
    }

    /// Adds a settings panel owned by `plugin_id`.
    pub async fn add_settings_panel(&self, plugin_id: &str, panel: SettingsPanel) -> SettingsPanel {
        upsert(&self.settings_panels, plugin_id, panel).await
    }

    /// Adds an editor extension owned by `plugin_id`.
    pub async fn add_editor_extension(
        &self,
        plugin_id: &str,
        extension: EditorExtension,
    ) -> EditorExtension {
        upsert(&self.editor_extensions, plugin_id, extension).await
    }

    /// Adds a custom route owned by `plugin_id`.
    pub async fn add_route(&self, plugin_id: &str, route: CustomRoute) -> CustomRoute {
        upsert(&self.routes, plugin_id, route).await
    }

    /// Removes the plugin entry and every contribution owned by `plugin_id`.
    ///
    /// Returns the number of removed items.
    pub async fn remove_plugin_contributions(&self, plugin_id: &str) -> usize {
        let mut removed = 0;

        {
            let mut plugins = self.plugins.write().await;
            let before = plugins.len();
            plugins.retain(|p| p.id != plugin_id);
            removed += before - plugins.len();
        }

        removed += remove_owned(&self.content_types, plugin_id).await;
        removed += remove_owned(&self.menu_items, plugin_id).await;
        removed += remove_owned(&self.settings_panels, plugin_id).await;
        removed += remove_owned(&self.editor_extensions, plugin_id).await;
        removed += remove_owned(&self.routes, plugin_id).await;

        info!(plugin_id = %plugin_id, removed = removed, "Plugin contributions removed");
        removed
    }

    /// Returns registered plugin metadata.
    pub async fn get_plugins(&self) -> Vec<PluginMetadata> {
        self.plugins.read().await.clone()
    }

    /// Returns registered content types.
    pub async fn get_content_types(&self) -> Vec<ContentType> {
        self.content_types.read().await.clone()
    }

    /// Returns registered menu items.
    pub async fn get_menu_items(&self) -> Vec<MenuItem> {
        self.menu_items.read().await.clone()
    }

    /// Returns registered settings panels.
    pub async fn get_settings_panels(&self) -> Vec<SettingsPanel> {
        self.settings_panels.read().await.clone()
    }

    /// Returns registered editor extensions.
    pub async fn get_editor_extensions(&self) -> Vec<EditorExtension> {
        self.editor_extensions.read().await.clone()
    }

    /// Returns registered custom routes.
    pub async fn get_custom_routes(&self) -> Vec<CustomRoute> {
        self.routes.read().await.clone()
    }

    /// Returns counts of everything registered.
    pub async fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            plugins: self.plugins.read().await.len(),
            content_types: self.content_types.read().await.len(),
            menu_items: self.menu_items.read().await.len(),
            settings_panels: self.settings_panels.read().await.len(),
            editor_extensions: self.editor_extensions.read().await.len(),
            routes: self.routes.read().await.len(),
        }
    }
}

async fn upsert<T>(list: &RwLock<Vec<T>>, plugin_id: &str, mut item: T) -> T
where
    T: Contribution + Clone,
{
    if item.plugin_id() != plugin_id && !item.plugin_id().is_empty() {
        debug!(
            plugin_id = %plugin_id,
            claimed = %item.plugin_id(),
            contribution = %item.id(),
            "Overriding claimed contribution owner"
        );
    }
    item.set_plugin_id(plugin_id);

    let mut items = list.write().await;
    match items
        .iter_mut()
        .find(|existing| existing.plugin_id() == plugin_id && existing.id() == item.id())
    {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
    }
    item
}

async fn remove_owned<T: Contribution>(list: &RwLock<Vec<T>>, plugin_id: &str) -> usize {
    let mut items = list.write().await;
    let before = items.len();
    items.retain(|item| item.plugin_id() != plugin_id);
    before - items.len()
}
