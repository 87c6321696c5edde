//! Content domain events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::EventKind;

/// Events emitted around content CRUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    /// A content item is about to be created.
    BeforeCreate {
        /// Content type identifier (e.g. `"article"`, `"product"`).
        content_type: String,
        /// Submitted fields.
        data: Value,
    },
    /// A content item was created.
    AfterCreate {
        /// The new content ID.
        content_id: Uuid,
        /// Content type identifier.
        content_type: String,
        /// Stored fields.
        data: Value,
    },
    /// A content item is about to be updated.
    BeforeUpdate {
        /// The content ID.
        content_id: Uuid,
        /// Content type identifier.
        content_type: String,
        /// Submitted changes.
        data: Value,
    },
    /// A content item was updated.
    AfterUpdate {
        /// The content ID.
        content_id: Uuid,
        /// Content type identifier.
        content_type: String,
        /// Stored fields.
        data: Value,
    },
    /// A content item is about to be deleted.
    BeforeDelete {
        /// The content ID.
        content_id: Uuid,
        /// Content type identifier.
        content_type: String,
    },
    /// A content item was deleted.
    AfterDelete {
        /// The content ID.
        content_id: Uuid,
        /// Content type identifier.
        content_type: String,
    },
}

impl ContentEvent {
    /// Returns the subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeCreate { .. } => EventKind::ContentBeforeCreate,
            Self::AfterCreate { .. } => EventKind::ContentAfterCreate,
            Self::BeforeUpdate { .. } => EventKind::ContentBeforeUpdate,
            Self::AfterUpdate { .. } => EventKind::ContentAfterUpdate,
            Self::BeforeDelete { .. } => EventKind::ContentBeforeDelete,
            Self::AfterDelete { .. } => EventKind::ContentAfterDelete,
        }
    }

    /// Returns the content type this event concerns.
    pub fn content_type(&self) -> &str {
        match self {
            Self::BeforeCreate { content_type, .. }
            | Self::AfterCreate { content_type, .. }
            | Self::BeforeUpdate { content_type, .. }
            | Self::AfterUpdate { content_type, .. }
            | Self::BeforeDelete { content_type, .. }
            | Self::AfterDelete { content_type, .. } => content_type,
        }
    }
}
