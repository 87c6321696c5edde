//! Plugin sources: where a plugin's assets are materialized on install.
//!
//! [`MemorySource`] keeps installed metadata in memory. [`DirectorySource`]
//! writes a `plugin.json` manifest under `<root>/<plugin_id>/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use cmsdash_core::error::AppError;
use cmsdash_core::result::AppResult;
use cmsdash_core::types::PluginMetadata;

/// Manifest file written for each installed plugin.
pub const MANIFEST_FILE: &str = "plugin.json";

/// Acquires and releases plugin assets.
#[async_trait]
pub trait PluginSource: Send + Sync + std::fmt::Debug + 'static {
    /// Materializes the assets for `metadata`.
    async fn acquire(&self, metadata: &PluginMetadata) -> AppResult<()>;

    /// Removes the assets of `plugin_id`. Fails if nothing is installed.
    async fn release(&self, plugin_id: &str) -> AppResult<()>;

    /// Returns metadata of every materialized plugin, sorted by id.
    async fn list(&self) -> AppResult<Vec<PluginMetadata>>;

    /// Returns whether `plugin_id` is materialized.
    async fn contains(&self, plugin_id: &str) -> AppResult<bool> {
        Ok(self.list().await?.iter().any(|m| m.id == plugin_id))
    }
}

/// In-memory plugin source.
#[derive(Debug, Default)]
pub struct MemorySource {
    installed: RwLock<BTreeMap<String, PluginMetadata>>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginSource for MemorySource {
    async fn acquire(&self, metadata: &PluginMetadata) -> AppResult<()> {
        self.installed
            .write()
            .await
            .insert(metadata.id.clone(), metadata.clone());
        Ok(())
    }

    async fn release(&self, plugin_id: &str) -> AppResult<()> {
        self.installed
            .write()
            .await
            .remove(plugin_id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Plugin '{plugin_id}' is not installed")))
    }

    async fn list(&self) -> AppResult<Vec<PluginMetadata>> {
        Ok(self.installed.read().await.values().cloned().collect())
    }

    async fn contains(&self, plugin_id: &str) -> AppResult<bool> {
        Ok(self.installed.read().await.contains_key(plugin_id))
    }
}

/// Plugin source backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `root`. The directory is created on first install.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn plugin_dir(&self, plugin_id: &str) -> AppResult<PathBuf> {
        let valid = !plugin_id.is_empty()
            && plugin_id != "."
            && plugin_id != ".."
            && !plugin_id.contains(['/', '\\']);
        if !valid {
            return Err(AppError::validation(format!(
                "Plugin id '{plugin_id}' is not a valid directory name"
            )));
        }
        Ok(self.root.join(plugin_id))
    }
}

#[async_trait]
impl PluginSource for DirectorySource {
    async fn acquire(&self, metadata: &PluginMetadata) -> AppResult<()> {
        let dir = self.plugin_dir(&metadata.id)?;
        tokio::fs::create_dir_all(&dir).await?;

        let manifest = serde_json::to_vec_pretty(metadata)?;
        tokio::fs::write(dir.join(MANIFEST_FILE), manifest).await?;

        debug!(plugin_id = %metadata.id, path = %dir.display(), "Plugin manifest written");
        Ok(())
    }

    async fn release(&self, plugin_id: &str) -> AppResult<()> {
        let dir = self.plugin_dir(plugin_id)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found(
                format!("Plugin '{plugin_id}' is not installed"),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> AppResult<Vec<PluginMetadata>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut plugins = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let manifest = entry.path().join(MANIFEST_FILE);
            let bytes = match tokio::fs::read(&manifest).await {
                Ok(bytes) => bytes,
                Err(_) => continue,
            };
            match serde_json::from_slice::<PluginMetadata>(&bytes) {
                Ok(metadata) => plugins.push(metadata),
                Err(e) => {
                    warn!(path = %manifest.display(), error = %e, "Skipping unreadable plugin manifest");
                }
            }
        }

        plugins.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(plugins)
    }

    async fn contains(&self, plugin_id: &str) -> AppResult<bool> {
        let dir = self.plugin_dir(plugin_id)?;
        Ok(tokio::fs::try_exists(dir.join(MANIFEST_FILE)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmsdash_core::error::ErrorKind;

    fn meta(id: &str) -> PluginMetadata {
        PluginMetadata::new(id, id.to_uppercase(), "1.0.0").with_dependency("base")
    }

    #[tokio::test]
    async fn test_memory_source_acquire_and_release() {
        let source = MemorySource::new();
        source.acquire(&meta("shop")).await.unwrap();
        assert!(source.contains("shop").await.unwrap());

        source.release("shop").await.unwrap();
        let err = source.release("shop").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_directory_source_writes_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(tmp.path().join("plugins"));

        source.acquire(&meta("shop")).await.unwrap();
        source.acquire(&meta("blog")).await.unwrap();

        let manifest = tmp.path().join("plugins/shop/plugin.json");
        assert!(manifest.exists());

        let listed = source.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "blog");
        assert_eq!(listed[1], meta("shop"));
    }

    #[tokio::test]
    async fn test_directory_source_release() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(tmp.path());

        source.acquire(&meta("shop")).await.unwrap();
        source.release("shop").await.unwrap();
        assert!(!source.contains("shop").await.unwrap());
        assert_eq!(
            source.release("shop").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_directory_source_skips_bad_manifests() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(tmp.path());
        source.acquire(&meta("shop")).await.unwrap();

        std::fs::create_dir_all(tmp.path().join("broken")).unwrap();
        std::fs::write(tmp.path().join("broken/plugin.json"), b"{not json").unwrap();
        std::fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let listed = source.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "shop");
    }

    #[tokio::test]
    async fn test_directory_source_rejects_path_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(tmp.path());
        let err = source
            .acquire(&PluginMetadata::new("../escape", "Escape", "1.0.0"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_directory_source_missing_root_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(tmp.path().join("nope"));
        assert!(source.list().await.unwrap().is_empty());
    }
}
