//! Typed events published on the event bus.
//!
//! Every event belongs to a closed set of variants with one payload shape
//! per event name. Subscriptions are keyed by [`EventKind`], whose
//! [`as_str`](EventKind::as_str) yields the `domain:name` form used in logs
//! (`cms:beforeInit`, `content:afterCreate`, `plugin:afterActivate`, ...).
//! Plugins may also publish ad-hoc events through [`CmsEvent::Custom`].

pub mod content;
pub mod media;
pub mod plugin;
pub mod system;
pub mod user;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

pub use content::ContentEvent;
pub use media::MediaEvent;
pub use plugin::PluginEvent;
pub use system::SystemEvent;
pub use user::UserEvent;

/// Union of all events carried by the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum CmsEvent {
    /// A CMS lifecycle event.
    System(SystemEvent),
    /// A content event.
    Content(ContentEvent),
    /// A media library event.
    Media(MediaEvent),
    /// A user account event.
    User(UserEvent),
    /// A plugin lifecycle or registration event.
    Plugin(PluginEvent),
    /// A plugin-defined event. Build it with [`CmsEvent::custom`], which
    /// refuses names that belong to a built-in [`EventKind`].
    Custom {
        /// Event name, conventionally `<plugin-id>:<name>`.
        name: String,
        /// Arbitrary payload.
        payload: serde_json::Value,
    },
}

impl CmsEvent {
    /// Creates a plugin-defined event.
    ///
    /// Fails with a validation error if `name` is a built-in event name such
    /// as `content:afterCreate`.
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> AppResult<Self> {
        let name = name.into();
        if !EventKind::from_name(&name).is_custom() {
            return Err(AppError::validation(format!(
                "'{name}' is a built-in event name"
            )));
        }
        Ok(Self::Custom { name, payload })
    }

    /// Returns the subscription key this event is delivered under.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::System(event) => event.kind(),
            Self::Content(event) => event.kind(),
            Self::Media(event) => event.kind(),
            Self::User(event) => event.kind(),
            Self::Plugin(event) => event.kind(),
            Self::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }

    /// Returns the plugin this event concerns, for plugin events.
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Self::Plugin(event) => Some(event.plugin_id()),
            _ => None,
        }
    }
}

impl From<SystemEvent> for CmsEvent {
    fn from(event: SystemEvent) -> Self {
        Self::System(event)
    }
}

impl From<ContentEvent> for CmsEvent {
    fn from(event: ContentEvent) -> Self {
        Self::Content(event)
    }
}

impl From<MediaEvent> for CmsEvent {
    fn from(event: MediaEvent) -> Self {
        Self::Media(event)
    }
}

impl From<UserEvent> for CmsEvent {
    fn from(event: UserEvent) -> Self {
        Self::User(event)
    }
}

impl From<PluginEvent> for CmsEvent {
    fn from(event: PluginEvent) -> Self {
        Self::Plugin(event)
    }
}

/// Subscription key for the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    // ── CMS ──
    /// `cms:beforeInit`
    CmsBeforeInit,
    /// `cms:afterInit`
    CmsAfterInit,
    /// `cms:shutdown`
    CmsShutdown,

    // ── Content ──
    /// `content:beforeCreate`
    ContentBeforeCreate,
    /// `content:afterCreate`
    ContentAfterCreate,
    /// `content:beforeUpdate`
    ContentBeforeUpdate,
    /// `content:afterUpdate`
    ContentAfterUpdate,
    /// `content:beforeDelete`
    ContentBeforeDelete,
    /// `content:afterDelete`
    ContentAfterDelete,

    // ── Media ──
    /// `media:beforeUpload`
    MediaBeforeUpload,
    /// `media:afterUpload`
    MediaAfterUpload,
    /// `media:afterDelete`
    MediaAfterDelete,

    // ── User ──
    /// `user:afterCreate`
    UserAfterCreate,
    /// `user:afterUpdate`
    UserAfterUpdate,
    /// `user:afterDelete`
    UserAfterDelete,
    /// `user:login`
    UserLogin,
    /// `user:logout`
    UserLogout,

    // ── Plugin loader ──
    /// `plugin:beforeLoad`
    PluginBeforeLoad,
    /// `plugin:afterLoad`
    PluginAfterLoad,
    /// `plugin:loadError`
    PluginLoadError,
    /// `plugin:beforeInstall`
    PluginBeforeInstall,
    /// `plugin:afterInstall`
    PluginAfterInstall,
    /// `plugin:installError`
    PluginInstallError,
    /// `plugin:beforeUninstall`
    PluginBeforeUninstall,
    /// `plugin:afterUninstall`
    PluginAfterUninstall,
    /// `plugin:uninstallError`
    PluginUninstallError,

    // ── Plugin manager ──
    /// `plugin:installed`
    PluginInstalled,
    /// `plugin:beforeActivate`
    PluginBeforeActivate,
    /// `plugin:afterActivate`
    PluginAfterActivate,
    /// `plugin:activationFailed`
    PluginActivationFailed,
    /// `plugin:beforeDeactivate`
    PluginBeforeDeactivate,
    /// `plugin:afterDeactivate`
    PluginAfterDeactivate,
    /// `plugin:uninstalled`
    PluginUninstalled,
    /// `plugin:statusChanged`
    PluginStatusChanged,
    /// `plugin:configUpdated`
    PluginConfigUpdated,

    // ── Extension registry ──
    /// `plugin:registered`
    PluginRegistered,
    /// `plugin:contentTypeRegistered`
    PluginContentTypeRegistered,
    /// `plugin:menuItemRegistered`
    PluginMenuItemRegistered,
    /// `plugin:settingsPanelRegistered`
    PluginSettingsPanelRegistered,
    /// `plugin:editorExtensionRegistered`
    PluginEditorExtensionRegistered,
    /// `plugin:routeRegistered`
    PluginRouteRegistered,

    /// A plugin-defined event name.
    Custom(String),
}

impl EventKind {
    /// Every built-in kind, in declaration order.
    pub const BUILTIN: &'static [EventKind] = &[
        Self::CmsBeforeInit,
        Self::CmsAfterInit,
        Self::CmsShutdown,
        Self::ContentBeforeCreate,
        Self::ContentAfterCreate,
        Self::ContentBeforeUpdate,
        Self::ContentAfterUpdate,
        Self::ContentBeforeDelete,
        Self::ContentAfterDelete,
        Self::MediaBeforeUpload,
        Self::MediaAfterUpload,
        Self::MediaAfterDelete,
        Self::UserAfterCreate,
        Self::UserAfterUpdate,
        Self::UserAfterDelete,
        Self::UserLogin,
        Self::UserLogout,
        Self::PluginBeforeLoad,
        Self::PluginAfterLoad,
        Self::PluginLoadError,
        Self::PluginBeforeInstall,
        Self::PluginAfterInstall,
        Self::PluginInstallError,
        Self::PluginBeforeUninstall,
        Self::PluginAfterUninstall,
        Self::PluginUninstallError,
        Self::PluginInstalled,
        Self::PluginBeforeActivate,
        Self::PluginAfterActivate,
        Self::PluginActivationFailed,
        Self::PluginBeforeDeactivate,
        Self::PluginAfterDeactivate,
        Self::PluginUninstalled,
        Self::PluginStatusChanged,
        Self::PluginConfigUpdated,
        Self::PluginRegistered,
        Self::PluginContentTypeRegistered,
        Self::PluginMenuItemRegistered,
        Self::PluginSettingsPanelRegistered,
        Self::PluginEditorExtensionRegistered,
        Self::PluginRouteRegistered,
    ];

    /// Returns the `domain:name` form of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CmsBeforeInit => "cms:beforeInit",
            Self::CmsAfterInit => "cms:afterInit",
            Self::CmsShutdown => "cms:shutdown",
            Self::ContentBeforeCreate => "content:beforeCreate",
            Self::ContentAfterCreate => "content:afterCreate",
            Self::ContentBeforeUpdate => "content:beforeUpdate",
            Self::ContentAfterUpdate => "content:afterUpdate",
            Self::ContentBeforeDelete => "content:beforeDelete",
            Self::ContentAfterDelete => "content:afterDelete",
            Self::MediaBeforeUpload => "media:beforeUpload",
            Self::MediaAfterUpload => "media:afterUpload",
            Self::MediaAfterDelete => "media:afterDelete",
            Self::UserAfterCreate => "user:afterCreate",
            Self::UserAfterUpdate => "user:afterUpdate",
            Self::UserAfterDelete => "user:afterDelete",
            Self::UserLogin => "user:login",
            Self::UserLogout => "user:logout",
            Self::PluginBeforeLoad => "plugin:beforeLoad",
            Self::PluginAfterLoad => "plugin:afterLoad",
            Self::PluginLoadError => "plugin:loadError",
            Self::PluginBeforeInstall => "plugin:beforeInstall",
            Self::PluginAfterInstall => "plugin:afterInstall",
            Self::PluginInstallError => "plugin:installError",
            Self::PluginBeforeUninstall => "plugin:beforeUninstall",
            Self::PluginAfterUninstall => "plugin:afterUninstall",
            Self::PluginUninstallError => "plugin:uninstallError",
            Self::PluginInstalled => "plugin:installed",
            Self::PluginBeforeActivate => "plugin:beforeActivate",
            Self::PluginAfterActivate => "plugin:afterActivate",
            Self::PluginActivationFailed => "plugin:activationFailed",
            Self::PluginBeforeDeactivate => "plugin:beforeDeactivate",
            Self::PluginAfterDeactivate => "plugin:afterDeactivate",
            Self::PluginUninstalled => "plugin:uninstalled",
            Self::PluginStatusChanged => "plugin:statusChanged",
            Self::PluginConfigUpdated => "plugin:configUpdated",
            Self::PluginRegistered => "plugin:registered",
            Self::PluginContentTypeRegistered => "plugin:contentTypeRegistered",
            Self::PluginMenuItemRegistered => "plugin:menuItemRegistered",
            Self::PluginSettingsPanelRegistered => "plugin:settingsPanelRegistered",
            Self::PluginEditorExtensionRegistered => "plugin:editorExtensionRegistered",
            Self::PluginRouteRegistered => "plugin:routeRegistered",
            Self::Custom(name) => name,
        }
    }

    /// Resolves a `domain:name` string, falling back to [`EventKind::Custom`].
    pub fn from_name(name: &str) -> Self {
        Self::BUILTIN
            .iter()
            .find(|kind| kind.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }

    /// Returns whether this is a plugin-defined kind.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
