//! Sapling - adaptive learning engine
//!
//! Sapling records graded attempts per learner and subject, scores mastery
//! from recent performance, and uses that to pick the next difficulty tier,
//! the next questions and the next subject to study. State lives in memory
//! and moves in and out through a JSON snapshot.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod stats;
pub mod storage;
pub mod util;

pub use config::EngineConfig;
pub use core::{
    question_id, AdjustmentRecord, AttemptResult, Clock, Difficulty, ManualClock, MasteryLevel,
    MasterySnapshot, PerformanceEntry, PerformanceKey, Priority, QuestionDescriptor,
    Recommendation, SystemClock, Trend,
};
pub use engine::{AdaptiveLearningEngine, DueTasks, MaintenanceReport, MaintenanceSchedule};
pub use error::{FailOpen, Result, SaplingError};
pub use stats::{analyze, PerformanceAnalytics};
pub use storage::{
    EngineSnapshot, FileSnapshotStore, MemorySnapshotStore, ParseReport, PerformanceStore,
    PruneReport, SnapshotStore, StoreLimits,
};

// CLI commands
pub use cli::{
    AdjustCommand, AnalyticsCommand, ExportCommand, ImportCommand, PruneCommand,
    RecommendCommand, ResetCommand, SelectCommand, TrackCommand,
};
