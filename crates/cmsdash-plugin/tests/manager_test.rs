//! Integration tests for the plugin manager state machine.

mod helpers;

use serde_json::json;

use cmsdash_core::types::{ConfigMap, PluginMetadata, PluginStatus};
use helpers::{Journal, Park, TestApp, TestPlugin};

#[tokio::test]
async fn test_unknown_status_is_default_and_not_tracked() {
    let journal = Journal::default();
    let app = TestApp::new(vec![], &journal);

    let status = app.ctx.manager.get_plugin_status("ghost").await;
    assert_eq!(status.plugin_id, "ghost");
    assert_eq!(status.status, PluginStatus::Installed);
    assert!(status.error.is_none());

    assert_eq!(app.store.writes(), 0);
    assert_eq!(app.store.reads(), 0);
    assert!(app.ctx.manager.get_installed_plugins().await.is_empty());
    assert!(!app.ctx.manager.is_installed("ghost").await);
}

#[tokio::test]
async fn test_status_query_does_not_block_later_install() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    app.ctx.manager.get_plugin_status("seo").await;
    assert!(app.install("seo").await);
}

#[tokio::test]
async fn test_install_twice_is_rejected() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    assert!(app.install("seo").await);
    let writes = app.store.writes();

    assert!(!app.install("seo").await);
    assert_eq!(app.ctx.manager.get_installed_plugins().await.len(), 1);
    assert_eq!(app.store.writes(), writes);
}

#[tokio::test]
async fn test_install_emits_loader_and_manager_events() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    assert!(app.install("seo").await);
    assert_eq!(
        app.events.entries(),
        vec![
            "plugin:beforeInstall",
            "plugin:afterInstall",
            "plugin:statusChanged",
            "plugin:installed",
        ]
    );
    assert!(app.ctx.loader.is_installed("seo").await);
}

#[tokio::test]
async fn test_install_rejects_mismatched_metadata() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    let installed = app
        .ctx
        .manager
        .install_plugin("seo", PluginMetadata::new("shop", "Shop", "1.0.0"))
        .await;
    assert!(!installed);
    assert!(!app.ctx.manager.is_installed("seo").await);
}

#[tokio::test]
async fn test_install_of_unknown_catalog_id_fails() {
    let journal = Journal::default();
    let app = TestApp::new(vec![], &journal);

    assert!(!app.install("nowhere").await);
    assert!(!app.ctx.manager.is_installed("nowhere").await);
    assert_eq!(app.events_matching("plugin:installError").len(), 1);
}

#[tokio::test]
async fn test_install_persist_failure_is_not_recorded() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    app.store.set_failing(true);
    assert!(!app.install("seo").await);
    assert!(!app.ctx.manager.is_installed("seo").await);
    assert!(!app.ctx.loader.is_installed("seo").await);
}

#[tokio::test]
async fn test_activate_and_deactivate_lifecycle() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    assert!(app.install_and_activate("seo").await);
    assert!(app.ctx.manager.is_active("seo").await);
    assert_eq!(app.ctx.registry.get_settings_panels().await.len(), 1);
    let row = app.store.get_row("seo").await;
    assert!(row.is_active);

    assert!(app.ctx.manager.deactivate_plugin("seo").await);
    let status = app.ctx.manager.get_plugin_status("seo").await;
    assert_eq!(status.status, PluginStatus::Inactive);
    assert!(!app.store.get_row("seo").await.is_active);

    assert_eq!(
        journal.entries(),
        vec!["init:seo", "cleanup-fn:seo", "cleanup:seo"]
    );
}

#[tokio::test]
async fn test_activate_event_sequence() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install("seo").await);
    app.events.clear();

    assert!(app.ctx.manager.activate_plugin("seo").await);
    assert_eq!(
        app.events.entries(),
        vec![
            "plugin:beforeActivate",
            "plugin:beforeLoad",
            "plugin:afterLoad",
            "plugin:registered",
            "plugin:settingsPanelRegistered",
            "plugin:menuItemRegistered",
            "plugin:routeRegistered",
            "plugin:statusChanged",
            "plugin:afterActivate",
        ]
    );
}

#[tokio::test]
async fn test_activate_is_idempotent() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    assert!(app.install_and_activate("seo").await);
    assert!(app.ctx.manager.activate_plugin("seo").await);
    assert_eq!(journal.entries(), vec!["init:seo"]);
    assert_eq!(app.ctx.registry.get_menu_items().await.len(), 1);
}

#[tokio::test]
async fn test_activate_untracked_plugin_fails() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);

    assert!(!app.ctx.manager.activate_plugin("seo").await);
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_deactivate_inactive_plugin_is_noop() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install("seo").await);

    assert!(app.ctx.manager.deactivate_plugin("seo").await);
    assert_eq!(
        app.ctx.manager.get_plugin_status("seo").await.status,
        PluginStatus::Installed
    );
}

#[tokio::test]
async fn test_failed_initialize_sets_error_and_rolls_back() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal).failing()], &journal);
    assert!(app.install("seo").await);

    assert!(!app.ctx.manager.activate_plugin("seo").await);

    let status = app.ctx.manager.get_plugin_status("seo").await;
    assert_eq!(status.status, PluginStatus::Error);
    assert!(status.error.unwrap().contains("refused to start"));

    let summary = app.ctx.registry.summary().await;
    assert_eq!(summary.settings_panels, 0);
    assert_eq!(summary.menu_items, 0);
    assert_eq!(summary.routes, 0);
    assert_eq!(summary.plugins, 0);

    // Only the test recorder is still listening.
    assert_eq!(app.create_content(), 1);
    assert!(!journal.contains("content:seo"));
    assert_eq!(app.events_matching("plugin:activationFailed").len(), 1);
    assert!(app.events_matching("plugin:afterActivate").is_empty());
}

#[tokio::test]
async fn test_panicking_initialize_is_contained() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal).panicking()], &journal);
    assert!(app.install("seo").await);

    assert!(!app.ctx.manager.activate_plugin("seo").await);
    assert_eq!(
        app.ctx.manager.get_plugin_status("seo").await.status,
        PluginStatus::Error
    );
}

#[tokio::test]
async fn test_error_status_can_be_retried() {
    let journal = Journal::default();
    let app = TestApp::new(
        vec![
            TestPlugin::new("seo", &journal),
            TestPlugin::new("shop", &journal).depends_on("seo"),
        ],
        &journal,
    );
    assert!(app.install("seo").await);
    assert!(app.install("shop").await);

    assert!(!app.ctx.manager.activate_plugin("shop").await);
    assert!(app.ctx.manager.activate_plugin("seo").await);
    assert!(app.ctx.manager.activate_plugin("shop").await);

    let status = app.ctx.manager.get_plugin_status("shop").await;
    assert_eq!(status.status, PluginStatus::Active);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_activation_persist_failure_keeps_memory_state() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install("seo").await);

    app.store.set_failing(true);
    assert!(!app.ctx.manager.activate_plugin("seo").await);
    assert!(app.ctx.manager.is_active("seo").await);
}

#[tokio::test]
async fn test_deactivation_removes_plugin_subscriptions() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install_and_activate("seo").await);

    app.create_content();
    assert!(journal.contains("content:seo"));

    assert!(app.ctx.manager.deactivate_plugin("seo").await);
    journal.clear();
    assert_eq!(app.create_content(), 1);
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_uninstall_active_plugin() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install_and_activate("seo").await);

    assert!(app.ctx.manager.uninstall_plugin("seo").await);
    assert!(!app.ctx.manager.is_installed("seo").await);
    assert!(app.ctx.manager.get_plugin_metadata("seo").await.is_none());
    assert!(app.store.try_row("seo").await.is_none());
    assert!(!app.ctx.loader.is_installed("seo").await);
    assert!(journal.contains("cleanup:seo"));
    assert_eq!(app.events_matching("plugin:uninstalled").len(), 1);
}

#[tokio::test]
async fn test_uninstall_blocked_by_dependents() {
    let journal = Journal::default();
    let app = TestApp::new(
        vec![
            TestPlugin::new("seo", &journal),
            TestPlugin::new("shop", &journal).depends_on("seo"),
        ],
        &journal,
    );
    assert!(app.install_and_activate("seo").await);
    assert!(app.install_and_activate("shop").await);

    assert!(!app.ctx.manager.uninstall_plugin("seo").await);
    assert!(app.ctx.manager.is_active("seo").await);
    assert!(app.store.try_row("seo").await.is_some());
}

#[tokio::test]
async fn test_uninstall_unknown_plugin_fails() {
    let journal = Journal::default();
    let app = TestApp::new(vec![], &journal);
    assert!(!app.ctx.manager.uninstall_plugin("ghost").await);
}

#[tokio::test]
async fn test_config_updates_merge() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install("seo").await);

    let mut first = ConfigMap::new();
    first.insert("a".into(), json!(1));
    assert!(app.ctx.manager.update_plugin_config("seo", first).await);

    let mut second = ConfigMap::new();
    second.insert("b".into(), json!(2));
    assert!(app.ctx.manager.update_plugin_config("seo", second).await);

    let status = app.ctx.manager.get_plugin_status("seo").await;
    assert_eq!(serde_json::Value::Object(status.config), json!({"a": 1, "b": 2}));
    assert!(status.updated_at >= status.installed_at);

    let row = app.store.get_row("seo").await;
    assert_eq!(serde_json::Value::Object(row.config), json!({"a": 1, "b": 2}));
    assert_eq!(app.events_matching("plugin:configUpdated").len(), 2);
}

#[tokio::test]
async fn test_config_update_for_unknown_plugin() {
    let journal = Journal::default();
    let app = TestApp::new(vec![], &journal);
    assert!(!app.ctx.manager.update_plugin_config("ghost", ConfigMap::new()).await);
}

#[tokio::test]
async fn test_installed_plugins_are_ordered_by_install_time() {
    let journal = Journal::default();
    let app = TestApp::new(
        vec![TestPlugin::new("zeta", &journal), TestPlugin::new("alpha", &journal)],
        &journal,
    );
    assert!(app.install("zeta").await);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert!(app.install("alpha").await);

    let ids: Vec<String> = app
        .ctx
        .manager
        .get_installed_plugins()
        .await
        .into_iter()
        .map(|r| r.plugin_id)
        .collect();
    assert_eq!(ids, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn test_concurrent_activation_initializes_once() {
    let journal = Journal::default();
    let app = TestApp::new(vec![TestPlugin::new("seo", &journal)], &journal);
    assert!(app.install("seo").await);

    let manager = app.ctx.manager.clone();
    let (a, b) = tokio::join!(manager.activate_plugin("seo"), manager.activate_plugin("seo"));
    assert!(a && b);
    assert_eq!(journal.entries(), vec!["init:seo"]);
}

#[tokio::test]
async fn test_deactivate_all_goes_dependents_first() {
    let journal = Journal::default();
    let app = TestApp::new(
        vec![
            TestPlugin::new("seo", &journal),
            TestPlugin::new("shop", &journal).depends_on("seo"),
        ],
        &journal,
    );
    assert!(app.install_and_activate("seo").await);
    assert!(app.install_and_activate("shop").await);
    journal.clear();

    app.ctx.manager.deactivate_all().await;

    assert_eq!(app.ctx.manager.active_count().await, 0);
    assert_eq!(
        journal.entries(),
        vec!["cleanup-fn:shop", "cleanup:shop", "cleanup-fn:seo", "cleanup:seo"]
    );
}

#[tokio::test]
async fn test_dependency_cannot_stop_while_dependent_initializes() {
    let journal = Journal::default();
    let park = Park::new();
    let app = TestApp::new(
        vec![
            TestPlugin::new("seo", &journal),
            TestPlugin::new("shop", &journal)
                .depends_on("seo")
                .parked_in_init(&park),
        ],
        &journal,
    );
    assert!(app.install_and_activate("seo").await);
    assert!(app.install("shop").await);

    let manager = app.ctx.manager.clone();
    let (activated, deactivated) = tokio::join!(manager.activate_plugin("shop"), async {
        park.reached.notified().await;
        let deactivated = manager.deactivate_plugin("seo").await;
        park.release.notify_one();
        deactivated
    });

    assert!(activated);
    assert!(!deactivated);
    assert!(manager.is_active("seo").await);
    assert!(manager.is_active("shop").await);
}

#[tokio::test]
async fn test_dependent_cannot_start_while_dependency_stops() {
    let journal = Journal::default();
    let park = Park::new();
    let app = TestApp::new(
        vec![
            TestPlugin::new("seo", &journal).parked_in_cleanup(&park),
            TestPlugin::new("shop", &journal).depends_on("seo"),
        ],
        &journal,
    );
    assert!(app.install_and_activate("seo").await);
    assert!(app.install("shop").await);

    let manager = app.ctx.manager.clone();
    let (deactivated, activated) = tokio::join!(manager.deactivate_plugin("seo"), async {
        park.reached.notified().await;
        let activated = manager.activate_plugin("shop").await;
        park.release.notify_one();
        activated
    });

    assert!(deactivated);
    assert!(!activated);
    assert!(!manager.is_active("seo").await);

    let shop = manager.get_plugin_status("shop").await;
    assert_eq!(shop.status, PluginStatus::Error);
    assert!(shop.error.unwrap().contains("seo"));
    assert!(!journal.contains("init:shop"));
}
