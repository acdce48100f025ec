//! Prune and reset commands.

use serde::{Deserialize, Serialize};

use crate::cli::render;
use crate::engine::AdaptiveLearningEngine;
use crate::storage::SnapshotStore;
use crate::util::parse_duration;

#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    pub json: bool,
    pub quiet: bool,
    /// Maximum age to keep (e.g. "30d", "12h"); the configured max age when unset.
    pub older_than: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneOutput {
    pub success: bool,
    pub entries_removed: usize,
    pub adjustments_removed: usize,
    pub keys_removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PruneOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

pub struct PruneCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> PruneCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &PruneOptions) -> PruneOutput {
        let max_age = match &options.older_than {
            Some(s) => match parse_duration(s) {
                Ok(d) => d,
                Err(e) => return PruneOutput::failure(e),
            },
            None => self.engine.config().maintenance.max_age(),
        };

        let report = self.engine.prune_older_than(max_age.num_milliseconds());
        if !report.is_empty() {
            if let Err(e) = self.engine.save() {
                return PruneOutput::failure(format!("Failed to save: {}", e));
            }
        }

        PruneOutput {
            success: true,
            entries_removed: report.entries_removed,
            adjustments_removed: report.adjustments_removed,
            keys_removed: report.keys_removed,
            error: None,
        }
    }

    pub fn format_output(&self, output: &PruneOutput, options: &PruneOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &PruneOutput) -> String {
        if !output.success {
            return format!(
                "Prune failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.entries_removed == 0 && output.adjustments_removed == 0 {
            return "Nothing to prune.\n".to_string();
        }
        format!(
            "Removed {} entr{} and {} adjustment record(s); {} key(s) emptied\n",
            output.entries_removed,
            if output.entries_removed == 1 { "y" } else { "ies" },
            output.adjustments_removed,
            output.keys_removed
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    pub json: bool,
    pub quiet: bool,
    pub user: String,
    /// Only this subject; every subject of the user when unset.
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetOutput {
    pub success: bool,
    pub user: String,
    pub subjects_removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ResetCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> ResetCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &ResetOptions) -> ResetOutput {
        let subjects_removed = match &options.subject {
            Some(subject) => usize::from(self.engine.reset(&options.user, subject)),
            None => self.engine.reset_user(&options.user),
        };

        let error = if subjects_removed > 0 {
            self.engine
                .save()
                .err()
                .map(|e| format!("Failed to save: {}", e))
        } else {
            None
        };

        ResetOutput {
            success: error.is_none(),
            user: options.user.clone(),
            subjects_removed,
            error,
        }
    }

    pub fn format_output(&self, output: &ResetOutput, options: &ResetOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &ResetOutput) -> String {
        if let Some(error) = &output.error {
            return format!("Reset failed: {}\n", error);
        }
        if output.subjects_removed == 0 {
            return format!("Nothing stored for {}.\n", output.user);
        }
        format!(
            "Reset {} subject(s) for {}\n",
            output.subjects_removed, output.user
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::{AttemptResult, ManualClock, QuestionDescriptor};
    use crate::storage::MemorySnapshotStore;
    use std::sync::Arc;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn track(engine: &AdaptiveLearningEngine, user: &str, subject: &str) {
        engine.track_performance(
            user,
            subject,
            &QuestionDescriptor::with_id("q"),
            &AttemptResult::correct(1000),
        );
    }

    #[test]
    fn test_prune_uses_duration() {
        let clock = Arc::new(ManualClock::new(0));
        let engine = AdaptiveLearningEngine::with_clock(
            EngineConfig::default(),
            MemorySnapshotStore::new(),
            clock.clone(),
        );
        track(&engine, "kid", "math");
        clock.set(3 * DAY_MS);
        track(&engine, "kid", "reading");

        let cmd = PruneCommand::new(&engine);
        let options = PruneOptions {
            older_than: Some("2d".to_string()),
            ..PruneOptions::default()
        };
        let output = cmd.run(&options);
        assert!(output.success);
        assert_eq!(output.entries_removed, 1);
        assert_eq!(output.keys_removed, 1);
        assert_eq!(engine.persistence().save_count(), 1);
        assert!(cmd
            .format_output(&output, &options)
            .starts_with("Removed 1 entry"));
    }

    #[test]
    fn test_prune_default_age_keeps_recent() {
        let engine = AdaptiveLearningEngine::in_memory();
        track(&engine, "kid", "math");

        let cmd = PruneCommand::new(&engine);
        let output = cmd.run(&PruneOptions::default());
        assert_eq!(output.entries_removed, 0);
        assert_eq!(engine.persistence().save_count(), 0);
        assert_eq!(
            cmd.format_output(&output, &PruneOptions::default()),
            "Nothing to prune.\n"
        );
    }

    #[test]
    fn test_prune_bad_duration() {
        let engine = AdaptiveLearningEngine::in_memory();
        let output = PruneCommand::new(&engine).run(&PruneOptions {
            older_than: Some("whenever".to_string()),
            ..PruneOptions::default()
        });
        assert!(!output.success);
    }

    #[test]
    fn test_reset_subject_and_user() {
        let engine = AdaptiveLearningEngine::in_memory();
        track(&engine, "kid", "math");
        track(&engine, "kid", "reading");
        track(&engine, "kid", "art");

        let cmd = ResetCommand::new(&engine);
        let one = cmd.run(&ResetOptions {
            user: "kid".to_string(),
            subject: Some("math".to_string()),
            ..ResetOptions::default()
        });
        assert_eq!(one.subjects_removed, 1);

        let options = ResetOptions {
            user: "kid".to_string(),
            ..ResetOptions::default()
        };
        let rest = cmd.run(&options);
        assert_eq!(rest.subjects_removed, 2);
        assert_eq!(cmd.format_output(&rest, &options), "Reset 2 subject(s) for kid\n");

        let none = cmd.run(&options);
        assert_eq!(none.subjects_removed, 0);
        assert_eq!(cmd.format_output(&none, &options), "Nothing stored for kid.\n");
        assert_eq!(engine.persistence().save_count(), 2);
    }
}
