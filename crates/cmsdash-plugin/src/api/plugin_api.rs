//! The per-plugin API object.
//!
//! A `PluginApi` is bound to exactly one plugin id. Contributions registered
//! through it are stamped with that id regardless of what the caller claims,
//! and every event subscription it creates is tracked so the manager can
//! drop them all when the plugin is deactivated. A disposed API ignores
//! further registrations and subscriptions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use cmsdash_core::error::AppError;
use cmsdash_core::events::{CmsEvent, EventKind, PluginEvent};
use cmsdash_core::result::AppResult;
use cmsdash_core::types::{ConfigMap, PluginMetadata};

use crate::events::{EventBus, Listener, Subscription};
use crate::registry::{
    ContentType, CustomRoute, EditorExtension, ExtensionRegistry, MenuItem, SettingsPanel,
};
use crate::status::StatusTable;

/// API surface handed to a plugin's `initialize`.
#[derive(Debug)]
pub struct PluginApi {
    /// The plugin this API is bound to.
    plugin_id: String,
    /// Shared extension registry.
    registry: Arc<ExtensionRegistry>,
    /// Shared event bus.
    events: EventBus,
    /// Shared status table, for configuration access.
    status: Arc<StatusTable>,
    /// Root directory for plugin-private storage.
    storage_root: String,
    /// Subscriptions created through this API.
    subscriptions: Mutex<Vec<Subscription>>,
    /// Set once by `dispose`.
    disposed: AtomicBool,
}

impl PluginApi {
    /// Creates an API bound to `plugin_id`.
    pub fn new(
        plugin_id: impl Into<String>,
        registry: Arc<ExtensionRegistry>,
        events: EventBus,
        status: Arc<StatusTable>,
        storage_root: impl Into<String>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            registry,
            events,
            status,
            storage_root: storage_root.into(),
            subscriptions: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// The plugin id this API is bound to.
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Registers the plugin's metadata in the extension registry.
    ///
    /// Fails with a validation error if `metadata.id` is not the bound id.
    pub async fn register_plugin(&self, metadata: PluginMetadata) -> AppResult<()> {
        if self.ignored("plugin") {
            return Ok(());
        }
        if metadata.id != self.plugin_id {
            return Err(AppError::validation(format!(
                "Plugin '{}' cannot register metadata for '{}'",
                self.plugin_id, metadata.id
            )));
        }
        self.registry.register_plugin(metadata).await;
        self.announce(PluginEvent::Registered {
            plugin_id: self.plugin_id.clone(),
        });
        Ok(())
    }

    /// Registers a content type.
    pub async fn register_content_type(&self, content_type: ContentType) {
        if self.ignored("content type") {
            return;
        }
        let stored = self
            .registry
            .add_content_type(&self.plugin_id, content_type)
            .await;
        self.announce(PluginEvent::ContentTypeRegistered {
            plugin_id: self.plugin_id.clone(),
            content_type_id: stored.id,
        });
    }

    /// Registers a sidebar menu item.
    pub async fn register_menu_item(&self, item: MenuItem) {
        if self.ignored("menu item") {
            return;
        }
        let stored = self.registry.add_menu_item(&self.plugin_id, item).await;
        self.announce(PluginEvent::MenuItemRegistered {
            plugin_id: self.plugin_id.clone(),
            item_id: stored.id,
        });
    }

    /// Registers a settings panel.
    pub async fn register_settings_panel(&self, panel: SettingsPanel) {
        if self.ignored("settings panel") {
            return;
        }
        let stored = self
            .registry
            .add_settings_panel(&self.plugin_id, panel)
            .await;
        self.announce(PluginEvent::SettingsPanelRegistered {
            plugin_id: self.plugin_id.clone(),
            panel_id: stored.id,
        });
    }

    /// Registers an editor extension.
    pub async fn register_editor_extension(&self, extension: EditorExtension) {
        if self.ignored("editor extension") {
            return;
        }
        let stored = self
            .registry
            .add_editor_extension(&self.plugin_id, extension)
            .await;
        self.announce(PluginEvent::EditorExtensionRegistered {
            plugin_id: self.plugin_id.clone(),
            extension_id: stored.id,
        });
    }

    /// Registers a custom dashboard route.
    pub async fn register_route(&self, route: CustomRoute) {
        if self.ignored("route") {
            return;
        }
        let stored = self.registry.add_route(&self.plugin_id, route).await;
        self.announce(PluginEvent::RouteRegistered {
            plugin_id: self.plugin_id.clone(),
            path: stored.path,
        });
    }

    /// Returns the plugin's current configuration.
    pub async fn get_config(&self) -> ConfigMap {
        self.status.config_of(&self.plugin_id).await
    }

    /// Shallow-merges `partial` into the plugin's configuration and persists it.
    pub async fn save_config(&self, partial: ConfigMap) -> bool {
        self.status.merge_config(&self.plugin_id, partial).await
    }

    /// Returns the plugin-private storage directory.
    pub fn get_storage_dir(&self) -> String {
        format!(
            "{}/{}",
            self.storage_root.trim_end_matches('/'),
            self.plugin_id
        )
    }

    /// Subscribes `listener` to `kind` for the lifetime of the plugin.
    pub fn on(&self, kind: EventKind, listener: Listener) -> Subscription {
        let subscription = self.events.on(kind, listener);
        self.track(&subscription);
        subscription
    }

    /// Subscribes `listener` to the next `kind` event only.
    pub fn once(&self, kind: EventKind, listener: Listener) -> Subscription {
        let subscription = self.events.once(kind, listener);
        self.track(&subscription);
        subscription
    }

    /// Emits `event` on the shared bus. Returns the number of listeners invoked.
    pub fn emit(&self, event: impl Into<CmsEvent>) -> usize {
        self.events.emit(&event.into())
    }

    /// Number of tracked subscriptions that are still live.
    pub fn active_subscriptions(&self) -> usize {
        self.lock_subscriptions()
            .iter()
            .filter(|s| s.is_active())
            .count()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Drops every subscription created through this API and stops
    /// accepting new ones.
    pub fn dispose(&self) -> usize {
        let subscriptions: Vec<Subscription> = {
            let mut tracked = self.lock_subscriptions();
            self.disposed.store(true, Ordering::SeqCst);
            tracked.drain(..).collect()
        };
        let removed = subscriptions.iter().filter(|s| s.unsubscribe()).count();
        debug!(plugin_id = %self.plugin_id, removed = removed, "Plugin subscriptions disposed");
        removed
    }

    fn track(&self, subscription: &Subscription) {
        let mut tracked = self.lock_subscriptions();
        if self.is_disposed() {
            drop(tracked);
            subscription.unsubscribe();
            debug!(
                plugin_id = %self.plugin_id,
                event = %subscription.kind(),
                "Subscription on disposed plugin API dropped"
            );
            return;
        }
        tracked.push(subscription.clone());
    }

    fn ignored(&self, what: &str) -> bool {
        let disposed = self.is_disposed();
        if disposed {
            debug!(
                plugin_id = %self.plugin_id,
                what = what,
                "Registration on disposed plugin API ignored"
            );
        }
        disposed
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn announce(&self, event: PluginEvent) {
        self.events.emit(&CmsEvent::from(event));
    }
}
