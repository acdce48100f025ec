//! Analytics command: show a learner's performance in one subject.

use serde::{Deserialize, Serialize};

use crate::cli::render;
use crate::core::{Difficulty, Trend};
use crate::engine::AdaptiveLearningEngine;
use crate::stats::PerformanceAnalytics;
use crate::storage::SnapshotStore;

#[derive(Debug, Clone, Default)]
pub struct AnalyticsOptions {
    pub json: bool,
    pub quiet: bool,
    pub user: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsOutput {
    pub success: bool,
    pub user: String,
    pub subject: String,
    pub analytics: PerformanceAnalytics,
}

pub struct AnalyticsCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> AnalyticsCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &AnalyticsOptions) -> AnalyticsOutput {
        AnalyticsOutput {
            success: true,
            user: options.user.clone(),
            subject: options.subject.clone(),
            analytics: self
                .engine
                .performance_analytics(&options.user, &options.subject),
        }
    }

    pub fn format_output(&self, output: &AnalyticsOutput, options: &AnalyticsOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &AnalyticsOutput) -> String {
        let a = &output.analytics;
        if a.total_attempts == 0 {
            return format!("No attempts recorded for {} in {}.\n", output.user, output.subject);
        }

        let trend = match a.recent_trend {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        };
        let list = |tiers: &[Difficulty]| {
            if tiers.is_empty() {
                "-".to_string()
            } else {
                tiers
                    .iter()
                    .map(|d| d.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };

        let lines = [
            format!("{} / {}", output.user, output.subject),
            format!("  Attempts:        {}", a.total_attempts),
            format!("  Accuracy:        {}%", a.accuracy),
            format!("  Avg response:    {}s", a.average_response_time),
            format!(
                "  Streak:          {} (longest {})",
                a.current_streak, a.longest_streak
            ),
            format!("  Mastery:         {} ({}%)", a.mastery_level, a.mastery_score),
            format!("  Consistency:     {}%", a.consistency),
            format!("  Trend:           {}", trend),
            format!("  Strong areas:    {}", list(&a.strong_areas)),
            format!("  Needs work:      {}", list(&a.improvement_areas)),
            format!("  Hint usage:      {}%", a.hint_usage_rate),
        ];
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttemptResult, QuestionDescriptor};

    fn options() -> AnalyticsOptions {
        AnalyticsOptions {
            user: "kid".to_string(),
            subject: "math".to_string(),
            ..AnalyticsOptions::default()
        }
    }

    #[test]
    fn test_empty_subject() {
        let engine = AdaptiveLearningEngine::in_memory();
        let cmd = AnalyticsCommand::new(&engine);
        let output = cmd.run(&options());

        assert!(output.success);
        assert_eq!(output.analytics, PerformanceAnalytics::default());
        assert_eq!(
            cmd.format_output(&output, &options()),
            "No attempts recorded for kid in math.\n"
        );
    }

    #[test]
    fn test_reports_tracked_attempts() {
        let engine = AdaptiveLearningEngine::in_memory();
        for (i, ok) in [true, true, false, true].into_iter().enumerate() {
            engine.track_performance(
                "kid",
                "math",
                &QuestionDescriptor::with_id(format!("q{}", i)),
                &AttemptResult::new(ok, 3000),
            );
        }

        let cmd = AnalyticsCommand::new(&engine);
        let output = cmd.run(&options());
        assert_eq!(output.analytics.total_attempts, 4);
        assert_eq!(output.analytics.accuracy, 75);

        let text = cmd.format_output(&output, &options());
        assert!(text.contains("Accuracy:        75%"));
        assert!(text.contains("Streak:          1 (longest 2)"));

        let json = cmd.format_output(
            &output,
            &AnalyticsOptions {
                json: true,
                ..options()
            },
        );
        assert!(json.contains("\"totalAttempts\": 4"));
    }
}
