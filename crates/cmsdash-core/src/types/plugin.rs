//! Plugin identity, installation status, and persisted records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Free-form, string-keyed plugin configuration.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Declared facts about a plugin. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    /// Unique plugin identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Plugin description.
    #[serde(default)]
    pub description: String,
    /// Author or maintainer.
    #[serde(default)]
    pub author: String,
    /// Optional icon reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Ids of plugins that must be active before this one.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PluginMetadata {
    /// Creates metadata with the required fields and no dependencies.
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            author: String::new(),
            icon: None,
            dependencies: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the icon reference.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Adds a dependency on another plugin id.
    pub fn with_dependency(mut self, plugin_id: impl Into<String>) -> Self {
        self.dependencies.push(plugin_id.into());
        self
    }

    /// Returns whether this plugin declares `plugin_id` as a dependency.
    pub fn depends_on(&self, plugin_id: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == plugin_id)
    }

    /// Rejects metadata missing its identity fields.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.trim().is_empty() || self.name.trim().is_empty() || self.version.trim().is_empty()
        {
            return Err(AppError::validation(format!(
                "Plugin metadata for '{}' must have a non-empty id, name and version",
                self.id
            )));
        }
        if self.depends_on(&self.id) {
            return Err(AppError::validation(format!(
                "Plugin '{}' cannot depend on itself",
                self.id
            )));
        }
        Ok(())
    }
}

/// Lifecycle status of an installed plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginStatus {
    /// Installed but never activated.
    Installed,
    /// Initialized and contributing to the registry.
    Active,
    /// Deactivated after having been active.
    Inactive,
    /// The last activation attempt failed.
    Error,
}

impl PluginStatus {
    /// Returns the string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "INSTALLED",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status record for one installed plugin, owned by the plugin manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInstallation {
    /// Plugin identifier.
    pub plugin_id: String,
    /// Current lifecycle status.
    pub status: PluginStatus,
    /// When the plugin was installed.
    pub installed_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
    /// Plugin configuration.
    #[serde(default)]
    pub config: ConfigMap,
    /// Message of the last activation failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginInstallation {
    /// Creates a fresh `INSTALLED` record.
    pub fn new(plugin_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            plugin_id: plugin_id.into(),
            status: PluginStatus::Installed,
            installed_at: now,
            updated_at: now,
            config: ConfigMap::new(),
            error: None,
        }
    }

    /// Moves the record to `status`, clearing any error and bumping `updated_at`.
    pub fn transition(&mut self, status: PluginStatus) {
        self.status = status;
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Marks the record as failed with `message`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = PluginStatus::Error;
        self.error = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// Rebuilds an in-memory record from a persisted row.
    ///
    /// Persisted-active rows come back as `INACTIVE`: the runtime state of a
    /// plugin does not survive a restart and must be re-established by
    /// activating it again.
    pub fn from_stored(stored: &StoredPlugin) -> Self {
        Self {
            plugin_id: stored.id.clone(),
            status: if stored.is_active {
                PluginStatus::Inactive
            } else {
                PluginStatus::Installed
            },
            installed_at: stored.installed_at,
            updated_at: stored.updated_at,
            config: stored.config.clone(),
            error: None,
        }
    }
}

/// A plugin row as seen by the persistence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlugin {
    /// Plugin identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Plugin description.
    #[serde(default)]
    pub description: String,
    /// Author or maintainer.
    #[serde(default)]
    pub author: String,
    /// Whether the plugin was active when last persisted.
    pub is_active: bool,
    /// Persisted configuration.
    #[serde(default)]
    pub config: ConfigMap,
    /// Install timestamp.
    pub installed_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl StoredPlugin {
    /// Builds the row persisted for a fresh installation.
    pub fn from_installation(metadata: &PluginMetadata, installation: &PluginInstallation) -> Self {
        Self {
            id: metadata.id.clone(),
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            description: metadata.description.clone(),
            author: metadata.author.clone(),
            is_active: installation.status == PluginStatus::Active,
            config: installation.config.clone(),
            installed_at: installation.installed_at,
            updated_at: installation.updated_at,
        }
    }
}

/// Shallow-merges `partial` into `target`; keys in `partial` win.
pub fn merge_config(target: &mut ConfigMap, partial: ConfigMap) {
    for (key, value) in partial {
        target.insert(key, value);
    }
}
