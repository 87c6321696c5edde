//! Event bus and re-exports of the typed event set.

pub mod bus;

pub use bus::{EventBus, Listener, ListenerResult, Subscription, listener};
pub use cmsdash_core::events::{
    CmsEvent, ContentEvent, EventKind, MediaEvent, PluginEvent, SystemEvent, UserEvent,
};
