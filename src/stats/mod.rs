//! Learning statistics for Sapling.
//!
//! Pure functions over a performance history, layered leaves first:
//! windowed statistics feed the mastery score, which drives difficulty
//! adjustment, question selection, recommendations and analytics.

pub mod analytics;
pub mod difficulty;
pub mod mastery;
pub mod recommendations;
pub mod selection;
pub mod statistics;

pub use analytics::{analyze, PerformanceAnalytics};
pub use difficulty::Transition;
pub use mastery::MasteryWindows;
pub use recommendations::{rank as rank_recommendations, recommend};
pub use selection::{recent_question_ids, select as select_questions};
