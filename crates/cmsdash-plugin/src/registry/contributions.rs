//! Extension contributions a plugin can register.
//!
//! Every contribution carries a `plugin_id`. Whatever value the plugin puts
//! there is overwritten by the registry with the id the API was created for.

use serde::{Deserialize, Serialize};

/// Common accessors used by the registry to stamp and filter contributions.
pub trait Contribution {
    /// Contribution id, unique within its owning plugin.
    fn id(&self) -> &str;

    /// Owning plugin.
    fn plugin_id(&self) -> &str;

    /// Overwrites the owning plugin.
    fn set_plugin_id(&mut self, plugin_id: &str);
}

macro_rules! impl_contribution {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Contribution for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn plugin_id(&self) -> &str {
                    &self.plugin_id
                }

                fn set_plugin_id(&mut self, plugin_id: &str) {
                    self.plugin_id = plugin_id.to_string();
                }
            }
        )*
    };
}

/// A content type contributed by a plugin (e.g. `product` from the shop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    /// Content type id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Field names shown by the editor.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Owning plugin, stamped by the registry.
    #[serde(default)]
    pub plugin_id: String,
}

impl ContentType {
    /// Creates a content type with no fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
            plugin_id: String::new(),
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}

/// An entry in the dashboard sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Menu item id.
    pub id: String,
    /// Label shown in the menu.
    pub label: String,
    /// Route the item navigates to.
    pub path: String,
    /// Optional icon reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Optional parent menu item id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Ordering hint (lower first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// Owning plugin, stamped by the registry.
    #[serde(default)]
    pub plugin_id: String,
}

impl MenuItem {
    /// Creates a top-level menu item.
    pub fn new(id: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: path.into(),
            icon: None,
            parent: None,
            order: None,
            plugin_id: String::new(),
        }
    }

    /// Sets the icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Nests the item under `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the ordering hint.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

/// A panel on the plugin settings screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPanel {
    /// Panel id.
    pub id: String,
    /// Panel title.
    pub title: String,
    /// Renderable component reference.
    pub component: String,
    /// Ordering hint (lower first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// Owning plugin, stamped by the registry.
    #[serde(default)]
    pub plugin_id: String,
}

impl SettingsPanel {
    /// Creates a settings panel.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            component: component.into(),
            order: None,
            plugin_id: String::new(),
        }
    }

    /// Sets the ordering hint.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

/// Where an editor extension mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorSlot {
    /// Toolbar button.
    Toolbar,
    /// Sidebar panel next to the editor.
    Sidebar,
    /// Custom block type.
    Block,
}

/// An extension of the content editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorExtension {
    /// Extension id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Mount point.
    pub slot: EditorSlot,
    /// Renderable component reference.
    pub component: String,
    /// Ordering hint (lower first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// Owning plugin, stamped by the registry.
    #[serde(default)]
    pub plugin_id: String,
}

impl EditorExtension {
    /// Creates an editor extension.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        slot: EditorSlot,
        component: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slot,
            component: component.into(),
            order: None,
            plugin_id: String::new(),
        }
    }
}

/// A dashboard route served by a plugin component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRoute {
    /// Route id.
    pub id: String,
    /// Route path, e.g. `/shop/orders`.
    pub path: String,
    /// Renderable component reference.
    pub component: String,
    /// Ordering hint used when routes overlap (lower first).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// Owning plugin, stamped by the registry.
    #[serde(default)]
    pub plugin_id: String,
}

impl CustomRoute {
    /// Creates a route.
    pub fn new(id: impl Into<String>, path: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            component: component.into(),
            order: None,
            plugin_id: String::new(),
        }
    }
}

impl_contribution!(ContentType, MenuItem, SettingsPanel, EditorExtension, CustomRoute);
