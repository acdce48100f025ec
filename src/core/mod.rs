//! Core data model: entries, snapshots, question identity and clocks.

pub mod clock;
pub mod identity;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::question_id;
pub use types::{
    AdjustmentRecord, AttemptResult, Difficulty, MasteryLevel, MasterySnapshot, PerformanceEntry,
    PerformanceKey, Priority, QuestionDescriptor, Recommendation, Trend,
};
