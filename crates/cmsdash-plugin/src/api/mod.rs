//! Plugin API: the per-plugin facade handed to `Plugin::initialize`.

pub mod plugin_api;

pub use plugin_api::PluginApi;
