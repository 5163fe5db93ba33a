//! Media storage
//!
//! Files live under the configured media root at the relative path derived
//! for them; rows store only that relative path.

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::config::MediaConfig;

/// Directory-backed asset storage
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.root.clone(), config.url.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored relative path.
    ///
    /// Paths that are absolute or climb out of the root are rejected.
    pub fn path_for(&self, relative: &str) -> Result<PathBuf> {
        let relative_path = Path::new(relative);
        let escapes = relative_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            bail!("Invalid media path: {:?}", relative);
        }
        Ok(self.root.join(relative_path))
    }

    /// Write `bytes` at `relative`, creating directories and replacing any
    /// existing file.
    pub async fn save(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(relative)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create media directory: {:?}", parent))?;
        }

        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write media file: {:?}", path))?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), relative);
        Ok(path)
    }

    /// Public URL of a stored relative path
    pub fn url_for(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}
