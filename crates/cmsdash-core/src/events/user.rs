//! User account events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EventKind;

/// Events emitted by user management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserEvent {
    /// A user account was created.
    AfterCreate {
        /// The new user ID.
        user_id: Uuid,
        /// Account email.
        email: String,
    },
    /// A user account was updated.
    AfterUpdate {
        /// The user ID.
        user_id: Uuid,
    },
    /// A user account was deleted.
    AfterDelete {
        /// The user ID.
        user_id: Uuid,
    },
    /// A user signed in to the dashboard.
    Login {
        /// The user ID.
        user_id: Uuid,
    },
    /// A user signed out.
    Logout {
        /// The user ID.
        user_id: Uuid,
    },
}

impl UserEvent {
    /// Returns the subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AfterCreate { .. } => EventKind::UserAfterCreate,
            Self::AfterUpdate { .. } => EventKind::UserAfterUpdate,
            Self::AfterDelete { .. } => EventKind::UserAfterDelete,
            Self::Login { .. } => EventKind::UserLogin,
            Self::Logout { .. } => EventKind::UserLogout,
        }
    }

    /// Returns the user this event concerns.
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::AfterCreate { user_id, .. }
            | Self::AfterUpdate { user_id }
            | Self::AfterDelete { user_id }
            | Self::Login { user_id }
            | Self::Logout { user_id } => *user_id,
        }
    }
}
