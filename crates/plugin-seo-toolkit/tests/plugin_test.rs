//! Integration tests for the SEO toolkit plugin.

use std::sync::Arc;

use serde_json::json;

use cmsdash_core::config::AppConfig;
use cmsdash_core::events::{CmsEvent, ContentEvent};
use cmsdash_core::types::{ConfigMap, PluginStatus};
use cmsdash_plugin::registry::EditorSlot;
use cmsdash_plugin::{AppContext, MemoryPluginStore, MemorySource, Plugin, PluginCatalog};
use plugin_seo_toolkit::{PLUGIN_ID, SeoToolkitPlugin};

fn make_context() -> AppContext {
    AppContext::new(
        AppConfig::default(),
        Arc::new(MemoryPluginStore::new()),
        Arc::new(MemorySource::new()),
        PluginCatalog::new().with_plugin(SeoToolkitPlugin::new),
    )
}

async fn activate(ctx: &AppContext) {
    let metadata = SeoToolkitPlugin::new().metadata();
    assert!(ctx.manager.install_plugin(PLUGIN_ID, metadata).await);
    assert!(ctx.manager.activate_plugin(PLUGIN_ID).await);
}

fn create_article(ctx: &AppContext, data: serde_json::Value) {
    ctx.events.emit(&CmsEvent::from(ContentEvent::AfterCreate {
        content_id: uuid::Uuid::new_v4(),
        content_type: "article".into(),
        data,
    }));
}

#[tokio::test]
async fn test_activation_registers_contributions() {
    let ctx = make_context();
    activate(&ctx).await;

    let panels = ctx.registry.get_settings_panels().await;
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].plugin_id, PLUGIN_ID);

    let extensions = ctx.registry.get_editor_extensions().await;
    assert_eq!(extensions[0].slot, EditorSlot::Sidebar);
    assert_eq!(ctx.registry.get_menu_items().await[0].path, "/seo");
    assert_eq!(ctx.registry.get_plugins().await[0].id, PLUGIN_ID);
}

#[tokio::test]
async fn test_default_config_written_once() {
    let ctx = make_context();
    activate(&ctx).await;

    let status = ctx.manager.get_plugin_status(PLUGIN_ID).await;
    assert_eq!(status.config, SeoToolkitPlugin::default_config());

    let mut custom = ConfigMap::new();
    custom.insert("titleSuffix".into(), json!(" | Acme"));
    assert!(ctx.manager.update_plugin_config(PLUGIN_ID, custom).await);

    assert!(ctx.manager.deactivate_plugin(PLUGIN_ID).await);
    assert!(ctx.manager.activate_plugin(PLUGIN_ID).await);

    let config = ctx.manager.get_plugin_status(PLUGIN_ID).await.config;
    assert_eq!(config["titleSuffix"], json!(" | Acme"));
}

#[tokio::test]
async fn test_analysis_can_be_disabled_by_config() {
    let ctx = make_context();
    let metadata = SeoToolkitPlugin::new().metadata();
    assert!(ctx.manager.install_plugin(PLUGIN_ID, metadata).await);

    let mut config = ConfigMap::new();
    config.insert("analyzeOnCreate".into(), json!(false));
    assert!(ctx.manager.update_plugin_config(PLUGIN_ID, config).await);
    assert!(ctx.manager.activate_plugin(PLUGIN_ID).await);

    assert_eq!(
        ctx.events
            .listener_count(&cmsdash_core::events::EventKind::ContentAfterCreate),
        0
    );
}

#[tokio::test]
async fn test_analyzer_subscription_follows_lifecycle() {
    let plugin = SeoToolkitPlugin::new();
    let analyzer = Arc::clone(plugin.analyzer());
    let api_ctx = make_context();
    let api = api_ctx.manager.create_plugin_api(PLUGIN_ID);

    let cleanup = plugin.initialize(api.clone()).await.unwrap();
    create_article(&api_ctx, json!({ "title": "Hi" }));
    assert_eq!(analyzer.reports().len(), 1);
    assert_eq!(analyzer.reports()[0].score, 25);

    api.dispose();
    create_article(&api_ctx, json!({}));
    assert_eq!(analyzer.reports().len(), 1);

    (cleanup.unwrap())().await.unwrap();
    assert!(analyzer.reports().is_empty());
}

#[tokio::test]
async fn test_deactivation_cleans_up() {
    let ctx = make_context();
    activate(&ctx).await;
    create_article(&ctx, json!({ "title": "A reasonably long title" }));

    assert!(ctx.manager.deactivate_plugin(PLUGIN_ID).await);
    assert_eq!(
        ctx.manager.get_plugin_status(PLUGIN_ID).await.status,
        PluginStatus::Inactive
    );
    assert!(ctx.registry.get_settings_panels().await.is_empty());
    assert!(ctx.registry.get_editor_extensions().await.is_empty());
}
