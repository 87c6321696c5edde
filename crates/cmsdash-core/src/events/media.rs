//! Media library events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventKind;

/// Events emitted by the media library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MediaEvent {
    /// A file is about to be uploaded.
    BeforeUpload {
        /// Original filename.
        filename: String,
        /// MIME type.
        mime_type: String,
        /// Size in bytes.
        size_bytes: u64,
    },
    /// A file was uploaded.
    AfterUpload {
        /// The new media ID.
        media_id: Uuid,
        /// Original filename.
        filename: String,
        /// MIME type.
        mime_type: String,
        /// Size in bytes.
        size_bytes: u64,
    },
    /// A media item was deleted.
    AfterDelete {
        /// The media ID.
        media_id: Uuid,
    },
}

impl MediaEvent {
    /// Returns the subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeUpload { .. } => EventKind::MediaBeforeUpload,
            Self::AfterUpload { .. } => EventKind::MediaAfterUpload,
            Self::AfterDelete { .. } => EventKind::MediaAfterDelete,
        }
    }
}
