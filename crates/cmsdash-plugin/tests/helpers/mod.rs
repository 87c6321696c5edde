//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use cmsdash_core::config::AppConfig;
use cmsdash_core::error::AppError;
use cmsdash_core::events::{CmsEvent, EventKind};
use cmsdash_core::result::AppResult;
use cmsdash_core::traits::PluginStore;
use cmsdash_core::types::{ConfigMap, PluginMetadata, StoredPlugin};
use cmsdash_plugin::events::listener;
use cmsdash_plugin::plugin::{CleanupFn, Plugin, cleanup_fn};
use cmsdash_plugin::registry::{CustomRoute, MenuItem, SettingsPanel};
use cmsdash_plugin::{AppContext, MemoryPluginStore, MemorySource, PluginApi, PluginCatalog};

/// Ordered log of things plugins and listeners did.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A pause point inside plugin code that a test controls.
#[derive(Debug, Clone, Default)]
pub struct Park {
    /// Notified when the plugin reaches the pause point.
    pub reached: Arc<Notify>,
    /// Notify to let the plugin continue.
    pub release: Arc<Notify>,
}

impl Park {
    pub fn new() -> Self {
        Self::default()
    }

    async fn wait(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }
}

/// Configurable plugin used across the integration tests.
///
/// On `initialize` it registers itself, one settings panel, one menu item and
/// one route, and listens to `content:afterCreate`.
#[derive(Debug, Clone)]
pub struct TestPlugin {
    pub metadata: PluginMetadata,
    pub claimed_owner: Option<String>,
    pub fail_init: bool,
    pub panic_init: bool,
    pub park_init: Option<Park>,
    pub park_cleanup: Option<Park>,
    pub journal: Journal,
}

impl TestPlugin {
    pub fn new(id: &str, journal: &Journal) -> Self {
        Self {
            metadata: PluginMetadata::new(id, id.to_uppercase(), "1.0.0"),
            claimed_owner: None,
            fail_init: false,
            panic_init: false,
            park_init: None,
            park_cleanup: None,
            journal: journal.clone(),
        }
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.metadata = self.metadata.with_dependency(dep);
        self
    }

    /// Puts another plugin's id on every contribution.
    pub fn claiming(mut self, owner: &str) -> Self {
        self.claimed_owner = Some(owner.to_string());
        self
    }

    /// Registers contributions, then fails.
    pub fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_init = true;
        self
    }

    /// Pauses `initialize` after its registrations until released.
    pub fn parked_in_init(mut self, park: &Park) -> Self {
        self.park_init = Some(park.clone());
        self
    }

    /// Pauses `cleanup` until released.
    pub fn parked_in_cleanup(mut self, park: &Park) -> Self {
        self.park_cleanup = Some(park.clone());
        self
    }
}

#[async_trait]
impl Plugin for TestPlugin {
    fn metadata(&self) -> PluginMetadata {
        self.metadata.clone()
    }

    async fn initialize(&self, api: Arc<PluginApi>) -> AppResult<Option<CleanupFn>> {
        let id = self.metadata.id.clone();
        self.journal.push(format!("init:{id}"));

        if self.panic_init {
            panic!("plugin {id} exploded");
        }

        api.register_plugin(self.metadata.clone()).await?;

        let owner = self.claimed_owner.clone().unwrap_or_default();
        let mut panel = SettingsPanel::new(format!("{id}-settings"), "Settings", "SettingsView");
        panel.plugin_id = owner.clone();
        api.register_settings_panel(panel).await;

        let mut item = MenuItem::new(format!("{id}-menu"), id.clone(), format!("/{id}"));
        item.plugin_id = owner.clone();
        api.register_menu_item(item).await;

        let mut route = CustomRoute::new(format!("{id}-route"), format!("/{id}"), "Page");
        route.plugin_id = owner;
        api.register_route(route).await;

        let journal = self.journal.clone();
        let listener_id = id.clone();
        api.on(
            EventKind::ContentAfterCreate,
            listener(move |_| {
                journal.push(format!("content:{listener_id}"));
                Ok(())
            }),
        );

        if let Some(park) = &self.park_init {
            park.wait().await;
        }

        if self.fail_init {
            return Err(AppError::plugin(format!("{id} refused to start")));
        }

        let journal = self.journal.clone();
        Ok(Some(cleanup_fn(move || async move {
            journal.push(format!("cleanup-fn:{id}"));
            Ok(())
        })))
    }

    async fn cleanup(&self) -> AppResult<()> {
        if let Some(park) = &self.park_cleanup {
            park.wait().await;
        }
        self.journal.push(format!("cleanup:{}", self.metadata.id));
        Ok(())
    }
}

/// Builds a catalog from test plugins.
pub fn catalog_of(plugins: Vec<TestPlugin>) -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    for plugin in plugins {
        catalog.register(move || plugin.clone());
    }
    catalog
}

/// Store that counts calls and can be switched into failure mode.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryPluginStore,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::persistence("store unavailable"));
        }
        Ok(())
    }

    fn read(&self) -> AppResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    fn write(&self) -> AppResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()
    }
}

#[async_trait]
impl PluginStore for CountingStore {
    async fn get_all_plugins(&self) -> AppResult<Vec<StoredPlugin>> {
        self.read()?;
        self.inner.get_all_plugins().await
    }

    async fn get_plugin_by_id(&self, plugin_id: &str) -> AppResult<Option<StoredPlugin>> {
        self.read()?;
        self.inner.get_plugin_by_id(plugin_id).await
    }

    async fn save_plugin(&self, plugin: &StoredPlugin) -> AppResult<()> {
        self.write()?;
        self.inner.save_plugin(plugin).await
    }

    async fn update_plugin_status(&self, plugin_id: &str, is_active: bool) -> AppResult<bool> {
        self.write()?;
        self.inner.update_plugin_status(plugin_id, is_active).await
    }

    async fn update_plugin_config(&self, plugin_id: &str, partial: &ConfigMap) -> AppResult<bool> {
        self.write()?;
        self.inner.update_plugin_config(plugin_id, partial).await
    }

    async fn delete_plugin(&self, plugin_id: &str) -> AppResult<bool> {
        self.write()?;
        self.inner.delete_plugin(plugin_id).await
    }
}

/// Test application context
pub struct TestApp {
    pub ctx: AppContext,
    pub store: Arc<CountingStore>,
    pub journal: Journal,
    /// Names of every built-in event emitted, in order.
    pub events: Journal,
}

impl TestApp {
    /// Creates an app whose catalog holds `plugins`.
    pub fn new(plugins: Vec<TestPlugin>, journal: &Journal) -> Self {
        Self::with_store(plugins, journal, Arc::new(CountingStore::new()), AppConfig::default())
    }

    /// Creates an app on an existing store, to simulate a restart.
    pub fn with_store(
        plugins: Vec<TestPlugin>,
        journal: &Journal,
        store: Arc<CountingStore>,
        config: AppConfig,
    ) -> Self {
        let ctx = AppContext::new(
            config,
            store.clone(),
            Arc::new(MemorySource::new()),
            catalog_of(plugins),
        );

        let events = Journal::default();
        let recorder = events.clone();
        let record = listener(move |event: &CmsEvent| {
            recorder.push(event.kind().as_str().to_string());
            Ok(())
        });
        for kind in EventKind::BUILTIN {
            ctx.events.on(kind.clone(), record.clone());
        }

        Self {
            ctx,
            store,
            journal: journal.clone(),
            events,
        }
    }

    /// Installs `plugin_id` using the metadata its catalog entry declares.
    pub async fn install(&self, plugin_id: &str) -> bool {
        let metadata = self
            .ctx
            .loader
            .catalog()
            .metadata(plugin_id)
            .unwrap_or_else(|| PluginMetadata::new(plugin_id, plugin_id, "1.0.0"));
        self.ctx.manager.install_plugin(plugin_id, metadata).await
    }

    /// Installs then activates.
    pub async fn install_and_activate(&self, plugin_id: &str) -> bool {
        self.install(plugin_id).await && self.ctx.manager.activate_plugin(plugin_id).await
    }

    /// Emits a `content:afterCreate` event.
    pub fn create_content(&self) -> usize {
        self.ctx.events.emit(&CmsEvent::from(
            cmsdash_core::events::ContentEvent::AfterCreate {
                content_id: uuid::Uuid::new_v4(),
                content_type: "article".to_string(),
                data: serde_json::json!({ "title": "Hello" }),
            },
        ))
    }

    /// Recorded event names that start with `prefix`.
    pub fn events_matching(&self, prefix: &str) -> Vec<String> {
        self.events
            .entries()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect()
    }
}

impl CountingStore {
    /// Returns the persisted row for `plugin_id`, panicking if absent.
    pub async fn get_row(&self, plugin_id: &str) -> StoredPlugin {
        self.try_row(plugin_id)
            .await
            .unwrap_or_else(|| panic!("no persisted row for {plugin_id}"))
    }

    /// Returns the persisted row without counting a read.
    pub async fn try_row(&self, plugin_id: &str) -> Option<StoredPlugin> {
        self.inner.get_plugin_by_id(plugin_id).await.unwrap()
    }
}
