//! JSON file snapshot storage
//!
//! Keeps the snapshot envelope in a single pretty-printed JSON file.
//! Writes go to a temp file first and are renamed into place.

use super::{decode, encode_pretty, SnapshotStorage};
use crate::error::Result;
use crate::store::Snapshot;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<Snapshot>> {
        if !fs::try_exists(&self.path).await? {
            tracing::info!("Snapshot file not found at {:?}, starting empty", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let snapshot = decode(&content)?;

        tracing::debug!(
            "Loaded snapshot from {:?} ({} bills, {} categories)",
            self.path,
            snapshot.bills.len(),
            snapshot.categories.len()
        );

        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let content = encode_pretty(snapshot)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first (atomic write)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        tracing::debug!("Snapshot saved to {:?}", self.path);

        Ok(())
    }
}
