//! Plugin runtime configuration.

use serde::{Deserialize, Serialize};

/// Where installed plugin assets are materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginSourceKind {
    /// Keep materialized plugins in process memory.
    #[default]
    Memory,
    /// Write a manifest per plugin under [`PluginConfig::directory`].
    Directory,
}

/// Plugin runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory where installed plugins are materialized.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Root of the per-plugin private storage convention.
    #[serde(default = "default_storage_root")]
    pub storage_root: String,
    /// Which plugin source backs installs.
    #[serde(default)]
    pub source: PluginSourceKind,
    /// Whether persisted active plugins are re-activated on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Core plugins installed and activated during bootstrap.
    #[serde(default)]
    pub core: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            storage_root: default_storage_root(),
            source: PluginSourceKind::default(),
            auto_load: true,
            core: Vec::new(),
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_storage_root() -> String {
    "plugin-data".to_string()
}

fn default_true() -> bool {
    true
}
