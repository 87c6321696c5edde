//! The `Plugin` trait implemented by every loadable plugin.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use cmsdash_core::result::AppResult;
use cmsdash_core::types::PluginMetadata;

use crate::api::PluginApi;

/// Cleanup closure returned by [`Plugin::initialize`].
///
/// Runs once on deactivation, before [`Plugin::cleanup`].
pub type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

/// Wraps an async closure into a [`CleanupFn`].
pub fn cleanup_fn<F, Fut>(f: F) -> CleanupFn
where
    F: FnOnce() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

/// Trait that all plugins must implement.
#[async_trait]
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Returns plugin metadata.
    fn metadata(&self) -> PluginMetadata;

    /// Called on activation with an API scoped to this plugin.
    ///
    /// Register contributions and subscribe to events here. The optional
    /// returned closure is run when the plugin is deactivated.
    async fn initialize(&self, api: Arc<PluginApi>) -> AppResult<Option<CleanupFn>>;

    /// Called on deactivation, after the cleanup closure.
    async fn cleanup(&self) -> AppResult<()> {
        Ok(())
    }
}
