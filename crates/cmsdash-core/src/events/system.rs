//! CMS lifecycle events.

use serde::{Deserialize, Serialize};

use super::EventKind;

/// Events emitted by the CMS bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SystemEvent {
    /// Bootstrap is about to restore plugins and load core plugins.
    BeforeInit,
    /// Bootstrap finished.
    AfterInit {
        /// Number of plugins active once bootstrap completed.
        active_plugins: usize,
    },
    /// The CMS is shutting down.
    Shutdown,
}

impl SystemEvent {
    /// Returns the subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeInit => EventKind::CmsBeforeInit,
            Self::AfterInit { .. } => EventKind::CmsAfterInit,
            Self::Shutdown => EventKind::CmsShutdown,
        }
    }
}
