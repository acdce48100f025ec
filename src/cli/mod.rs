//! CLI commands for Sapling.
//!
//! Every command follows the same shape: an `XOptions` struct filled from
//! clap, an `XCommand` borrowing the engine, `run` producing a serializable
//! `XOutput`, and `format_output` rendering it as JSON, text or nothing.
//!
//! - **Learner commands**: track, analytics, adjust, select, recommend
//! - **Data commands**: export, import, prune, reset

pub mod adjust;
pub mod analytics;
pub mod maintain;
pub mod recommend;
pub mod select;
pub mod track;
pub mod transfer;

pub use adjust::AdjustCommand;
pub use analytics::AnalyticsCommand;
pub use maintain::{PruneCommand, ResetCommand};
pub use recommend::RecommendCommand;
pub use select::SelectCommand;
pub use track::TrackCommand;
pub use transfer::{ExportCommand, ImportCommand};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::AdaptiveLearningEngine;
use crate::error::{Result, SaplingError};
use crate::storage::FileSnapshotStore;

/// Open the engine backed by the configured snapshot file and load it.
pub fn open_engine(config: EngineConfig) -> Result<AdaptiveLearningEngine<FileSnapshotStore>> {
    config.validate()?;
    let path = config
        .snapshot_path()
        .ok_or_else(|| SaplingError::config("Could not determine snapshot path"))?;
    let store = FileSnapshotStore::with_path(path)?;

    let engine = AdaptiveLearningEngine::new(config, store);
    engine.load()?;
    Ok(engine)
}

/// Render a command output: nothing when quiet, pretty JSON, or `human`.
pub fn render<T: Serialize>(
    output: &T,
    json: bool,
    quiet: bool,
    human: impl FnOnce(&T) -> String,
) -> String {
    if quiet {
        return String::new();
    }

    if json {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    } else {
        human(output)
    }
}

/// Percentage of a fraction for display.
pub(crate) fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}
