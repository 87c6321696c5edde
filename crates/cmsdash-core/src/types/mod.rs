//! Shared data model for the plugin runtime.

pub mod plugin;

pub use plugin::{
    ConfigMap, PluginInstallation, PluginMetadata, PluginStatus, StoredPlugin, merge_config,
};
