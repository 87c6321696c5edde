//! CmsDash: plugin runtime for the CMS admin dashboard.
//!
//! Main entry point that wires the plugin crates together, boots the CMS and
//! waits for a shutdown signal.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use cmsdash_core::config::AppConfig;
use cmsdash_core::error::AppError;
use cmsdash_plugin::{AppContext, MemoryPluginStore, PluginCatalog};
use plugin_seo_toolkit::SeoToolkitPlugin;
use plugin_shop::ShopPlugin;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = format!("{e:#}"), "CmsDash error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CMSDASH_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Plugins compiled into this binary.
fn builtin_catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with_plugin(SeoToolkitPlugin::new)
        .with_plugin(ShopPlugin::new)
}

/// Main run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting CmsDash v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        source = ?config.plugins.source,
        core = ?config.plugins.core,
        auto_load = config.plugins.auto_load,
        "Plugin runtime configuration"
    );

    let ctx = AppContext::from_config(
        config,
        Arc::new(MemoryPluginStore::new()),
        builtin_catalog(),
    );
    tracing::info!(available = ?ctx.loader.catalog().ids(), "Plugin catalog ready");

    ctx.cms
        .initialize()
        .await
        .context("CMS bootstrap failed")?;

    let summary = ctx.registry.summary().await;
    tracing::info!(
        plugins = summary.plugins,
        content_types = summary.content_types,
        menu_items = summary.menu_items,
        settings_panels = summary.settings_panels,
        editor_extensions = summary.editor_extensions,
        routes = summary.routes,
        "Extension registry populated"
    );
    for record in ctx.manager.get_installed_plugins().await {
        tracing::info!(
            plugin_id = %record.plugin_id,
            status = %record.status,
            error = ?record.error,
            "Installed plugin"
        );
    }

    shutdown_signal().await;

    ctx.cms.shutdown().await;
    tracing::info!("CmsDash shut down cleanly");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
