//! Persistence of trained model bundles.
//!
//! The bundle is one JSON document replaced atomically on every save, so a
//! reader never observes a half-written set of models.

use crate::application::ml::{ArtifactBundle, ArtifactStore};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

/// Stores the bundle as JSON at `file_path`, keeping up to `keep_versions`
/// timestamped copies of previous bundles next to it.
pub struct FileArtifactStore {
    file_path: PathBuf,
    keep_versions: usize,
}

impl FileArtifactStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            keep_versions: 0,
        }
    }

    pub fn with_keep_versions(mut self, keep_versions: usize) -> Self {
        self.keep_versions = keep_versions;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn stem(&self) -> String {
        self.file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string())
    }

    fn backup_prefix(&self) -> String {
        format!("{}.v", self.stem())
    }

    /// Previous bundles, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = self.file_path.parent().filter(|d| d.exists()) else {
            return Ok(Vec::new());
        };
        let prefix = self.backup_prefix();
        let mut backups: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to list {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    fn rotate(&self) -> Result<()> {
        if self.keep_versions == 0 || !self.file_path.exists() {
            return Ok(());
        }
        let backup = self.file_path.with_file_name(format!(
            "{}{}.json",
            self.backup_prefix(),
            Utc::now().format("%Y%m%dT%H%M%S%6f")
        ));
        fs::copy(&self.file_path, &backup).context("Failed to back up previous bundle")?;

        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(self.keep_versions);
        for old in backups.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&old) {
                warn!("Failed to remove old bundle {:?}: {}", old, e);
            }
        }
        Ok(())
    }
}

impl ArtifactStore for FileArtifactStore {
    fn save(&self, bundle: &ArtifactBundle) -> Result<()> {
        if !bundle.is_complete() {
            bail!(
                "Refusing to persist incomplete bundle (trained: {:?})",
                bundle.trained_tasks()
            );
        }
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).context("Failed to create model directory")?;
        }
        let content = serde_json::to_string(bundle).context("Failed to serialize models")?;

        self.rotate()?;

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp model file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename model file")?;

        info!("Saved models to {:?}", self.file_path);
        Ok(())
    }

    fn load(&self) -> Result<Option<ArtifactBundle>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.file_path).context("Failed to read model file")?;
        let bundle: ArtifactBundle =
            serde_json::from_str(&content).context("Failed to parse model JSON")?;

        info!("Loaded models from {:?}", self.file_path);
        Ok(Some(bundle))
    }
}

/// Keeps the serialized bundle in memory; each load deserializes a fresh copy.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    content: RwLock<Option<String>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.content.read().map(|c| c.is_none()).unwrap_or(true)
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn save(&self, bundle: &ArtifactBundle) -> Result<()> {
        let content = serde_json::to_string(bundle).context("Failed to serialize models")?;
        let mut slot = self
            .content
            .write()
            .map_err(|_| anyhow::anyhow!("Artifact store lock poisoned"))?;
        *slot = Some(content);
        Ok(())
    }

    fn load(&self) -> Result<Option<ArtifactBundle>> {
        let slot = self
            .content
            .read()
            .map_err(|_| anyhow::anyhow!("Artifact store lock poisoned"))?;
        slot.as_deref()
            .map(|c| serde_json::from_str(c).context("Failed to parse model JSON"))
            .transpose()
    }
}
