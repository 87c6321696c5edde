//! Struct-based event handlers.

use std::sync::Arc;

use cmsdash_core::events::{CmsEvent, EventKind};
use cmsdash_plugin::api::PluginApi;
use cmsdash_plugin::events::{ListenerResult, Subscription, listener};

/// An event handler implemented as a type instead of a closure.
pub trait EventHandler: Send + Sync + std::fmt::Debug + 'static {
    /// The event kind this handler responds to.
    fn kind(&self) -> EventKind;

    /// Handles one event. An `Err` is logged by the bus and does not affect
    /// other listeners.
    fn handle(&self, event: &CmsEvent) -> ListenerResult;
}

/// Subscribes `handler` through `api` for the lifetime of the plugin.
pub fn subscribe<H: EventHandler>(api: &PluginApi, handler: Arc<H>) -> Subscription {
    let kind = handler.kind();
    tracing::debug!(
        plugin_id = %api.plugin_id(),
        event = %kind,
        handler = ?handler,
        "Subscribing event handler"
    );
    api.on(kind, listener(move |event| handler.handle(event)))
}
