//! Recommend command: rank subjects by what to study next.

use serde::{Deserialize, Serialize};

use crate::cli::{percent, render};
use crate::core::Recommendation;
use crate::engine::AdaptiveLearningEngine;
use crate::storage::SnapshotStore;

#[derive(Debug, Clone, Default)]
pub struct RecommendOptions {
    pub json: bool,
    pub quiet: bool,
    pub user: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendOutput {
    pub success: bool,
    pub recommendations: Vec<Recommendation>,
}

pub struct RecommendCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> RecommendCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    /// With no subjects given, every subject the learner has state for is ranked.
    pub fn run(&self, options: &RecommendOptions) -> RecommendOutput {
        let subjects: Vec<String> = if options.subjects.is_empty() {
            self.engine
                .tracked_keys()
                .into_iter()
                .filter(|k| k.user_id == options.user)
                .map(|k| k.subject)
                .collect()
        } else {
            options.subjects.clone()
        };

        RecommendOutput {
            success: true,
            recommendations: self
                .engine
                .recommend_learning_path(&options.user, &subjects),
        }
    }

    pub fn format_output(&self, output: &RecommendOutput, options: &RecommendOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &RecommendOutput) -> String {
        if output.recommendations.is_empty() {
            return "No subjects to recommend.\n".to_string();
        }

        let mut lines = Vec::new();
        for (i, rec) in output.recommendations.iter().enumerate() {
            let mut line = format!(
                "{}. [{}] {} at {}: {}",
                i + 1,
                rec.priority,
                rec.subject,
                rec.recommended_difficulty,
                rec.reason
            );
            if let Some(accuracy) = rec.accuracy {
                line.push_str(&format!(" (accuracy {})", percent(accuracy)));
            }
            if let Some(minutes) = rec.estimated_time {
                line.push_str(&format!(" ~{} min", minutes));
            }
            lines.push(line);
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttemptResult, Priority, QuestionDescriptor};

    fn engine() -> AdaptiveLearningEngine {
        let engine = AdaptiveLearningEngine::in_memory();
        for i in 0..6 {
            engine.track_performance(
                "kid",
                "math",
                &QuestionDescriptor::with_id(format!("q{}", i)),
                &AttemptResult::new(i % 2 == 0, 5000),
            );
        }
        engine
    }

    #[test]
    fn test_recommend_given_subjects() {
        let engine = engine();
        let cmd = RecommendCommand::new(&engine);
        let options = RecommendOptions {
            user: "kid".to_string(),
            subjects: vec!["math".to_string(), "reading".to_string()],
            ..RecommendOptions::default()
        };

        let output = cmd.run(&options);
        let subjects: Vec<&str> = output
            .recommendations
            .iter()
            .map(|r| r.subject.as_str())
            .collect();
        // both high priority; the new subject sorts first
        assert_eq!(subjects, vec!["reading", "math"]);
        assert!(output
            .recommendations
            .iter()
            .all(|r| r.priority == Priority::High));

        let text = cmd.format_output(&output, &options);
        assert!(text.starts_with("1. [high] reading at EASY"));
        assert!(text.contains("2. [high] math"));
        assert!(text.contains("(accuracy 50%)"));
    }

    #[test]
    fn test_recommend_defaults_to_tracked_subjects() {
        let engine = engine();
        let cmd = RecommendCommand::new(&engine);
        let output = cmd.run(&RecommendOptions {
            user: "kid".to_string(),
            ..RecommendOptions::default()
        });
        assert_eq!(output.recommendations.len(), 1);
        assert_eq!(output.recommendations[0].subject, "math");

        let other = cmd.run(&RecommendOptions {
            user: "stranger".to_string(),
            ..RecommendOptions::default()
        });
        assert_eq!(
            cmd.format_output(&other, &RecommendOptions::default()),
            "No subjects to recommend.\n"
        );
    }
}
