//! Plugin lifecycle and registration events.
//!
//! Loader events (`beforeLoad`, `afterInstall`, ...) describe work on plugin
//! code and assets. Manager events (`installed`, `afterActivate`,
//! `statusChanged`, ...) describe transitions of the installation record.
//! Registry events announce contributions made through a plugin's API.

use serde::{Deserialize, Serialize};

use super::EventKind;
use crate::types::plugin::PluginStatus;

/// Events concerning a single plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PluginEvent {
    // ── Loader ──
    /// Plugin code is about to be loaded.
    BeforeLoad {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// Plugin code was loaded.
    AfterLoad {
        /// Plugin identifier.
        plugin_id: String,
        /// Loaded version.
        version: String,
    },
    /// Plugin code could not be loaded.
    LoadError {
        /// Plugin identifier.
        plugin_id: String,
        /// Failure description.
        error: String,
    },
    /// Plugin assets are about to be acquired.
    BeforeInstall {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// Plugin assets were acquired.
    AfterInstall {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// Plugin assets could not be acquired.
    InstallError {
        /// Plugin identifier.
        plugin_id: String,
        /// Failure description.
        error: String,
    },
    /// Plugin assets are about to be removed.
    BeforeUninstall {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// Plugin assets were removed.
    AfterUninstall {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// Plugin assets could not be removed.
    UninstallError {
        /// Plugin identifier.
        plugin_id: String,
        /// Failure description.
        error: String,
    },

    // ── Manager ──
    /// An installation record was created.
    Installed {
        /// Plugin identifier.
        plugin_id: String,
        /// Installed version.
        version: String,
    },
    /// Activation is starting.
    BeforeActivate {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// The plugin is active.
    AfterActivate {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// Activation failed and the plugin is in `ERROR`.
    ActivationFailed {
        /// Plugin identifier.
        plugin_id: String,
        /// Failure description.
        error: String,
    },
    /// Deactivation is starting.
    BeforeDeactivate {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// The plugin is inactive.
    AfterDeactivate {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// The installation record was removed.
    Uninstalled {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// The installation status changed. `None` means no record.
    StatusChanged {
        /// Plugin identifier.
        plugin_id: String,
        /// Previous status.
        from: Option<PluginStatus>,
        /// New status.
        to: Option<PluginStatus>,
    },
    /// The plugin configuration was updated.
    ConfigUpdated {
        /// Plugin identifier.
        plugin_id: String,
        /// Keys present in the partial update.
        keys: Vec<String>,
    },

    // ── Registry ──
    /// Plugin metadata was registered through the plugin API.
    Registered {
        /// Plugin identifier.
        plugin_id: String,
    },
    /// A content type was registered.
    ContentTypeRegistered {
        /// Owning plugin.
        plugin_id: String,
        /// Content type id.
        content_type_id: String,
    },
    /// A menu item was registered.
    MenuItemRegistered {
        /// Owning plugin.
        plugin_id: String,
        /// Menu item id.
        item_id: String,
    },
    /// A settings panel was registered.
    SettingsPanelRegistered {
        /// Owning plugin.
        plugin_id: String,
        /// Panel id.
        panel_id: String,
    },
    /// An editor extension was registered.
    EditorExtensionRegistered {
        /// Owning plugin.
        plugin_id: String,
        /// Extension id.
        extension_id: String,
    },
    /// A custom route was registered.
    RouteRegistered {
        /// Owning plugin.
        plugin_id: String,
        /// Route path.
        path: String,
    },
}

impl PluginEvent {
    /// Returns the subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeLoad { .. } => EventKind::PluginBeforeLoad,
            Self::AfterLoad { .. } => EventKind::PluginAfterLoad,
            Self::LoadError { .. } => EventKind::PluginLoadError,
            Self::BeforeInstall { .. } => EventKind::PluginBeforeInstall,
            Self::AfterInstall { .. } => EventKind::PluginAfterInstall,
            Self::InstallError { .. } => EventKind::PluginInstallError,
            Self::BeforeUninstall { .. } => EventKind::PluginBeforeUninstall,
            Self::AfterUninstall { .. } => EventKind::PluginAfterUninstall,
            Self::UninstallError { .. } => EventKind::PluginUninstallError,
            Self::Installed { .. } => EventKind::PluginInstalled,
            Self::BeforeActivate { .. } => EventKind::PluginBeforeActivate,
            Self::AfterActivate { .. } => EventKind::PluginAfterActivate,
            Self::ActivationFailed { .. } => EventKind::PluginActivationFailed,
            Self::BeforeDeactivate { .. } => EventKind::PluginBeforeDeactivate,
            Self::AfterDeactivate { .. } => EventKind::PluginAfterDeactivate,
            Self::Uninstalled { .. } => EventKind::PluginUninstalled,
            Self::StatusChanged { .. } => EventKind::PluginStatusChanged,
            Self::ConfigUpdated { .. } => EventKind::PluginConfigUpdated,
            Self::Registered { .. } => EventKind::PluginRegistered,
            Self::ContentTypeRegistered { .. } => EventKind::PluginContentTypeRegistered,
            Self::MenuItemRegistered { .. } => EventKind::PluginMenuItemRegistered,
            Self::SettingsPanelRegistered { .. } => EventKind::PluginSettingsPanelRegistered,
            Self::EditorExtensionRegistered { .. } => EventKind::PluginEditorExtensionRegistered,
            Self::RouteRegistered { .. } => EventKind::PluginRouteRegistered,
        }
    }

    /// Returns the plugin this event concerns.
    pub fn plugin_id(&self) -> &str {
        match self {
            Self::BeforeLoad { plugin_id }
            | Self::AfterLoad { plugin_id, .. }
            | Self::LoadError { plugin_id, .. }
            | Self::BeforeInstall { plugin_id }
            | Self::AfterInstall { plugin_id }
            | Self::InstallError { plugin_id, .. }
            | Self::BeforeUninstall { plugin_id }
            | Self::AfterUninstall { plugin_id }
            | Self::UninstallError { plugin_id, .. }
            | Self::Installed { plugin_id, .. }
            | Self::BeforeActivate { plugin_id }
            | Self::AfterActivate { plugin_id }
            | Self::ActivationFailed { plugin_id, .. }
            | Self::BeforeDeactivate { plugin_id }
            | Self::AfterDeactivate { plugin_id }
            | Self::Uninstalled { plugin_id }
            | Self::StatusChanged { plugin_id, .. }
            | Self::ConfigUpdated { plugin_id, .. }
            | Self::Registered { plugin_id }
            | Self::ContentTypeRegistered { plugin_id, .. }
            | Self::MenuItemRegistered { plugin_id, .. }
            | Self::SettingsPanelRegistered { plugin_id, .. }
            | Self::EditorExtensionRegistered { plugin_id, .. }
            | Self::RouteRegistered { plugin_id, .. } => plugin_id,
        }
    }
}
