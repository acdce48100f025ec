//! Persistence collaborator trait.
//!
//! The engine hands a serialized snapshot to a `SnapshotStore` and asks it for
//! one back. What the store does with the string (keep it in memory, write a
//! file, post it somewhere) is up to the implementation.

use std::sync::Arc;

use crate::error::Result;

/// Durable home for the engine's serialized snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Return the last saved snapshot, or `Ok(None)` if nothing was saved.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &str) -> Result<()>;

    /// Forget the stored snapshot. Succeeds if there is none.
    fn clear(&self) -> Result<()>;

    fn exists(&self) -> Result<bool> {
        Ok(self.load()?.is_some())
    }
}

/// Lets tests keep a handle on a store they gave to an engine.
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, snapshot: &str) -> Result<()> {
        (**self).save(snapshot)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
