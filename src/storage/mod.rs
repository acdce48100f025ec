//! State storage for Sapling.
//!
//! `store` holds the live per-key state, `snapshot` is the export/import wire
//! format, and the `SnapshotStore` backends persist that format.

pub mod file;
pub mod memory;
pub mod snapshot;
pub mod store;
pub mod traits;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use snapshot::{EngineSnapshot, ParseReport, UserSubjectMap};
pub use store::{KeyState, PerformanceStore, PruneReport, StoreLimits};
pub use traits::SnapshotStore;
