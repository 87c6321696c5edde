//! Prelude for convenient imports.

pub use async_trait::async_trait;
pub use std::sync::Arc;

pub use cmsdash_core::error::{AppError, ErrorKind};
pub use cmsdash_core::events::{
    CmsEvent, ContentEvent, EventKind, MediaEvent, PluginEvent, SystemEvent, UserEvent,
};
pub use cmsdash_core::result::AppResult;
pub use cmsdash_core::types::{ConfigMap, PluginMetadata, PluginStatus};

pub use crate::api::PluginApi;
pub use crate::events::{Listener, ListenerResult, Subscription, listener};
pub use crate::plugin::{CleanupFn, Plugin, cleanup_fn};
pub use crate::registry::{
    ContentType, CustomRoute, EditorExtension, EditorSlot, MenuItem, SettingsPanel,
};

pub use crate::plugin_metadata;
