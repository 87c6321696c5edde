//! Shop plugin: registers with the CmsDash plugin system.

use serde_json::json;

use cmsdash_plugin_sdk::prelude::*;

use crate::catalog::ProductIndex;
use crate::{PLUGIN_ID, PRODUCT_TYPE};

/// E-commerce plugin
#[derive(Debug, Default)]
pub struct ShopPlugin {
    products: Arc<ProductIndex>,
}

impl ShopPlugin {
    /// Create a new shop plugin
    pub fn new() -> Self {
        Self::default()
    }

    /// Products created while the plugin is active.
    pub fn products(&self) -> &Arc<ProductIndex> {
        &self.products
    }
}

#[async_trait]
impl Plugin for ShopPlugin {
    fn metadata(&self) -> PluginMetadata {
        plugin_metadata!(
            id: PLUGIN_ID,
            name: "Shop",
            version: "0.9.0",
            description: "Products, orders and checkout settings",
            author: "CmsDash Team",
            icon: "shopping-cart",
            dependencies: [plugin_seo_toolkit::PLUGIN_ID]
        )
    }

    async fn initialize(&self, api: Arc<PluginApi>) -> AppResult<Option<CleanupFn>> {
        api.register_plugin(self.metadata()).await?;

        if api.get_config().await.is_empty() {
            let mut defaults = ConfigMap::new();
            defaults.insert("currency".into(), json!("USD"));
            defaults.insert("taxRate".into(), json!(0.0));
            if !api.save_config(defaults).await {
                tracing::warn!(plugin_id = PLUGIN_ID, "Default shop config not persisted");
            }
        }

        api.register_content_type(
            ContentType::new(PRODUCT_TYPE, "Product")
                .with_field("name")
                .with_field("sku")
                .with_field("price")
                .with_field("stock"),
        )
        .await;

        api.register_menu_item(
            MenuItem::new("shop", "Shop", "/shop")
                .with_icon("shopping-cart")
                .with_order(40),
        )
        .await;
        api.register_menu_item(
            MenuItem::new("shop-products", "Products", "/shop/products")
                .with_parent("shop")
                .with_order(1),
        )
        .await;
        api.register_menu_item(
            MenuItem::new("shop-orders", "Orders", "/shop/orders")
                .with_parent("shop")
                .with_order(2),
        )
        .await;

        api.register_route(CustomRoute::new("products", "/shop/products", "ProductList"))
            .await;
        api.register_route(CustomRoute::new("orders", "/shop/orders", "OrderList"))
            .await;
        api.register_settings_panel(SettingsPanel::new("shop-settings", "Shop", "ShopSettings"))
            .await;

        let products = Arc::clone(&self.products);
        let on_content = listener(move |event| products.apply(event));
        for kind in [
            EventKind::ContentAfterCreate,
            EventKind::ContentAfterUpdate,
            EventKind::ContentAfterDelete,
        ] {
            api.on(kind, on_content.clone());
        }

        tracing::info!(plugin_id = PLUGIN_ID, "Shop initialized");
        Ok(None)
    }

    async fn cleanup(&self) -> AppResult<()> {
        self.products.clear();
        tracing::info!(plugin_id = PLUGIN_ID, "Shop cleaned up");
        Ok(())
    }
}
