//! Adjust command: ask for the next difficulty tier.

use serde::{Deserialize, Serialize};

use crate::cli::render;
use crate::core::Difficulty;
use crate::engine::AdaptiveLearningEngine;
use crate::storage::SnapshotStore;

#[derive(Debug, Clone, Default)]
pub struct AdjustOptions {
    pub json: bool,
    pub quiet: bool,
    pub user: String,
    pub subject: String,
    /// The tier the learner is on now.
    pub current: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Difficulty>,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdjustOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            from: None,
            to: None,
            changed: false,
            reason: None,
            error: Some(error.into()),
        }
    }
}

pub struct AdjustCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> AdjustCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &AdjustOptions) -> AdjustOutput {
        let current: Difficulty = match options.current.parse() {
            Ok(d) => d,
            Err(e) => return AdjustOutput::failure(e.to_string()),
        };

        let to = self
            .engine
            .adjust_difficulty(&options.user, &options.subject, current);
        let changed = to != current;

        let reason = if changed {
            if let Err(e) = self.engine.save() {
                return AdjustOutput::failure(format!("Failed to save: {}", e));
            }
            self.engine
                .adjustment_log(&options.user, &options.subject)
                .last()
                .map(|r| r.reason.clone())
        } else {
            None
        };

        AdjustOutput {
            success: true,
            from: Some(current),
            to: Some(to),
            changed,
            reason,
            error: None,
        }
    }

    pub fn format_output(&self, output: &AdjustOutput, options: &AdjustOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &AdjustOutput) -> String {
        match (output.success, output.from, output.to) {
            (true, Some(from), Some(to)) if output.changed => format!(
                "{} -> {}: {}\n",
                from,
                to,
                output.reason.as_deref().unwrap_or("adjusted")
            ),
            (true, Some(from), _) => format!("Stay at {}\n", from),
            _ => format!(
                "Adjust failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttemptResult, QuestionDescriptor};
    use crate::stats::difficulty::reasons;

    fn options(current: &str) -> AdjustOptions {
        AdjustOptions {
            user: "kid".to_string(),
            subject: "math".to_string(),
            current: current.to_string(),
            ..AdjustOptions::default()
        }
    }

    fn engine_with(outcomes: &[bool], ms: u64) -> AdaptiveLearningEngine {
        let engine = AdaptiveLearningEngine::in_memory();
        for (i, ok) in outcomes.iter().enumerate() {
            engine.track_performance(
                "kid",
                "math",
                &QuestionDescriptor::with_id(format!("q{}", i)),
                &AttemptResult::new(*ok, ms),
            );
        }
        engine
    }

    #[test]
    fn test_escalates_and_saves() {
        let engine = engine_with(&[true; 6], 2000);
        let cmd = AdjustCommand::new(&engine);

        let output = cmd.run(&options("easy"));
        assert!(output.changed);
        assert_eq!(output.to, Some(Difficulty::Medium));
        assert_eq!(output.reason.as_deref(), Some(reasons::READY_FOR_CHALLENGE));
        assert_eq!(engine.persistence().save_count(), 1);

        let text = cmd.format_output(&output, &options("easy"));
        assert!(text.starts_with("EASY -> MEDIUM"));
    }

    #[test]
    fn test_hold_does_not_save() {
        let engine = engine_with(&[true, false, true, true], 4000);
        let cmd = AdjustCommand::new(&engine);

        let output = cmd.run(&options("MEDIUM"));
        assert!(!output.changed);
        assert!(output.reason.is_none());
        assert_eq!(engine.persistence().save_count(), 0);
        assert_eq!(cmd.format_output(&output, &options("MEDIUM")), "Stay at MEDIUM\n");
    }

    #[test]
    fn test_invalid_current() {
        let engine = AdaptiveLearningEngine::in_memory();
        let output = AdjustCommand::new(&engine).run(&options("impossible"));
        assert!(!output.success);
        assert!(output.error.is_some());
    }
}
