//! SEO toolkit plugin: registers with the CmsDash plugin system.

use serde_json::{Value, json};

use cmsdash_plugin_sdk::prelude::*;

use crate::PLUGIN_ID;
use crate::analyzer::SeoAnalyzer;

/// SEO toolkit plugin
#[derive(Debug, Default)]
pub struct SeoToolkitPlugin {
    analyzer: Arc<SeoAnalyzer>,
}

impl SeoToolkitPlugin {
    /// Create a new SEO toolkit plugin
    pub fn new() -> Self {
        Self::default()
    }

    /// The content analyzer, shared with the event subscription.
    pub fn analyzer(&self) -> &Arc<SeoAnalyzer> {
        &self.analyzer
    }

    /// Configuration written on first activation.
    pub fn default_config() -> ConfigMap {
        let mut config = ConfigMap::new();
        config.insert("titleSuffix".into(), json!(""));
        config.insert("analyzeOnCreate".into(), json!(true));
        config.insert("sitemap".into(), json!(true));
        config
    }
}

#[async_trait]
impl Plugin for SeoToolkitPlugin {
    fn metadata(&self) -> PluginMetadata {
        plugin_metadata!(
            id: PLUGIN_ID,
            name: "SEO Toolkit",
            version: "1.2.0",
            description: "Meta tags, sitemap settings and on-page SEO analysis",
            author: "CmsDash Team",
            icon: "search"
        )
    }

    async fn initialize(&self, api: Arc<PluginApi>) -> AppResult<Option<CleanupFn>> {
        api.register_plugin(self.metadata()).await?;

        let mut config = api.get_config().await;
        if config.is_empty() {
            config = Self::default_config();
            if !api.save_config(config.clone()).await {
                tracing::warn!(plugin_id = PLUGIN_ID, "Default SEO config not persisted");
            }
        }

        api.register_settings_panel(
            SettingsPanel::new("seo-settings", "SEO", "SeoSettingsPanel").with_order(20),
        )
        .await;
        api.register_menu_item(
            MenuItem::new("seo", "SEO", "/seo")
                .with_icon("search")
                .with_order(60),
        )
        .await;
        api.register_editor_extension(EditorExtension::new(
            "seo-preview",
            "Search preview",
            EditorSlot::Sidebar,
            "SeoPreview",
        ))
        .await;

        let analyze = config
            .get("analyzeOnCreate")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if analyze {
            subscribe(&api, Arc::clone(&self.analyzer));
        }

        tracing::info!(
            plugin_id = PLUGIN_ID,
            analyze_on_create = analyze,
            storage = %api.get_storage_dir(),
            "SEO toolkit initialized"
        );

        let analyzer = Arc::clone(&self.analyzer);
        Ok(Some(cleanup_fn(move || async move {
            analyzer.clear();
            Ok(())
        })))
    }
}
