//! Plugin catalog: the set of plugin implementations compiled into the
//! binary, keyed by plugin id.
//!
//! The loader resolves ids against the catalog instead of importing code at
//! runtime. Each entry is a factory so every activation gets a fresh
//! instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use cmsdash_core::types::PluginMetadata;

use crate::plugin::Plugin;

/// Constructs a plugin instance.
pub type PluginFactory = Arc<dyn Fn() -> Arc<dyn Plugin> + Send + Sync>;

/// Plugin implementations available to the loader.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    /// Plugin id → factory.
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin, keyed by the id its metadata declares.
    pub fn with_plugin<P, F>(mut self, factory: F) -> Self
    where
        P: Plugin + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.register(factory);
        self
    }

    /// Adds a plugin, keyed by the id its metadata declares.
    ///
    /// A later registration for the same id replaces the earlier one.
    pub fn register<P, F>(&mut self, factory: F)
    where
        P: Plugin + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        let id = factory().metadata().id;
        self.insert(id, Arc::new(move || Arc::new(factory()) as Arc<dyn Plugin>));
    }

    /// Adds a factory under an explicit id.
    ///
    /// The loader still checks that the produced plugin declares `id`.
    pub fn insert(&mut self, id: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(id.into(), factory);
    }

    /// Returns the factory for `id`.
    pub fn get(&self, id: &str) -> Option<PluginFactory> {
        self.factories.get(id).cloned()
    }

    /// Returns the metadata declared by the plugin registered under `id`.
    pub fn metadata(&self, id: &str) -> Option<PluginMetadata> {
        self.factories.get(id).map(|factory| factory().metadata())
    }

    /// Returns whether `id` is available.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Returns all available ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Number of available plugins.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("plugins", &self.ids())
            .finish()
    }
}
