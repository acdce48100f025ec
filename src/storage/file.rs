//! File-based snapshot storage.
//!
//! The snapshot lives in a single JSON file, by default
//! `~/.sapling/snapshot.json`. Writes go to a temp file in the same directory
//! which is then renamed over the target.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::default_snapshot_path;
use crate::error::{Result, SaplingError};
use crate::storage::SnapshotStore;
use crate::util::read_to_string_limited;

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Store at the default path (`$SAPLING_HOME/snapshot.json`).
    pub fn new() -> Result<Self> {
        let path = default_snapshot_path().ok_or_else(|| {
            SaplingError::config("Could not determine snapshot path (no home directory)")
        })?;
        Self::with_path(path)
    }

    /// Store at a custom path. The parent directory is created if missing.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| SaplingError::storage(parent, e))?;
            }
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.json".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn atomic_write(&self, contents: &str) -> Result<()> {
        let temp_path = self.temp_path();

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| SaplingError::storage(&temp_path, e))?;
            file.write_all(contents.as_bytes())
                .map_err(|e| SaplingError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| SaplingError::storage(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| SaplingError::storage(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), bytes = contents.len(), "Wrote snapshot");
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        read_to_string_limited(&self.path).map(Some)
    }

    fn save(&self, snapshot: &str) -> Result<()> {
        self.atomic_write(snapshot)
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| SaplingError::storage(&self.path, e))?;
        }

        let temp_path = self.temp_path();
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }
}
