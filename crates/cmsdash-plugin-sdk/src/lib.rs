//! # cmsdash-plugin-sdk
//!
//! SDK for developing plugins for the CmsDash admin dashboard.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cmsdash_plugin_sdk::prelude::*;
//!
//! #[derive(Debug)]
//! struct MyPlugin;
//!
//! #[async_trait]
//! impl Plugin for MyPlugin {
//!     fn metadata(&self) -> PluginMetadata {
//!         plugin_metadata!(id: "my-plugin", name: "My Plugin", version: "1.0.0")
//!     }
//!
//!     async fn initialize(&self, api: Arc<PluginApi>) -> AppResult<Option<CleanupFn>> {
//!         api.register_plugin(self.metadata()).await?;
//!         api.register_menu_item(MenuItem::new("mine", "Mine", "/mine")).await;
//!         Ok(None)
//!     }
//! }
//! ```

pub mod handler;

/// Prelude for convenient imports.
pub mod prelude {
    pub use cmsdash_plugin::prelude::*;

    pub use crate::handler::{EventHandler, subscribe};
}
