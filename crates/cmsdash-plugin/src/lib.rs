//! # cmsdash-plugin
//!
//! Plugin runtime for the CMS admin dashboard. Provides:
//!
//! - Typed, synchronous event bus with isolated listeners
//! - Extension registry and per-plugin scoped API
//! - Plugin catalog, asset sources and loader
//! - Dependency-aware plugin manager (install, activate, deactivate, uninstall)
//! - CMS bootstrap and application context wiring

pub mod api;
pub mod bootstrap;
pub mod catalog;
pub mod context;
pub mod dependency;
pub mod events;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod plugin;
pub mod prelude;
pub mod registry;
pub mod source;
pub mod status;
pub mod store;

pub use api::PluginApi;
pub use bootstrap::CmsCore;
pub use catalog::{PluginCatalog, PluginFactory};
pub use context::AppContext;
pub use events::{EventBus, Subscription};
pub use loader::PluginLoader;
pub use manager::PluginManager;
pub use plugin::{CleanupFn, Plugin};
pub use registry::{ExtensionRegistry, RegistrySummary};
pub use source::{DirectorySource, MemorySource, PluginSource};
pub use status::StatusTable;
pub use store::MemoryPluginStore;
