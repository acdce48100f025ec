//! In-memory snapshot storage, used by tests and by hosts that persist
//! elsewhere.

use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::storage::SnapshotStore;

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: RwLock<Option<String>>,
    saves: RwLock<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a snapshot already saved.
    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot.into())),
            saves: RwLock::new(0),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<String>> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot.clone())
    }

    fn save(&self, snapshot: &str) -> Result<()> {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.to_string());
        *self.saves.write().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
