//! Track command: record one graded attempt.

use serde::{Deserialize, Serialize};

use crate::cli::{percent, render};
use crate::core::{AttemptResult, Difficulty, MasterySnapshot, PerformanceEntry, QuestionDescriptor};
use crate::engine::AdaptiveLearningEngine;
use crate::storage::SnapshotStore;

#[derive(Debug, Clone, Default)]
pub struct TrackOptions {
    pub json: bool,
    pub quiet: bool,
    pub user: String,
    pub subject: String,
    /// Explicit question id.
    pub id: Option<String>,
    pub word: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    /// EASY, MEDIUM or HARD; MEDIUM when omitted.
    pub difficulty: Option<String>,
    pub correct: bool,
    /// Milliseconds.
    pub response_time: u64,
    pub hint: bool,
    pub attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<PerformanceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery: Option<MasterySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrackOutput {
    pub fn success(entry: PerformanceEntry, mastery: Option<MasterySnapshot>) -> Self {
        Self {
            success: true,
            entry: Some(entry),
            mastery,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            entry: None,
            mastery: None,
            error: Some(error.into()),
        }
    }
}

pub struct TrackCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> TrackCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &TrackOptions) -> TrackOutput {
        let difficulty = match options
            .difficulty
            .as_deref()
            .map(str::parse::<Difficulty>)
            .transpose()
        {
            Ok(d) => d,
            Err(e) => return TrackOutput::failure(e.to_string()),
        };

        let descriptor = QuestionDescriptor {
            id: options.id.clone(),
            word: options.word.clone(),
            question: options.question.clone(),
            answer: options.answer.clone(),
            difficulty,
            ..QuestionDescriptor::default()
        };
        if descriptor.id.is_none()
            && descriptor.word.is_none()
            && descriptor.question.is_none()
            && descriptor.answer.is_none()
        {
            return TrackOutput::failure("A question needs --id, --word, --question or --answer");
        }

        let mut result =
            AttemptResult::new(options.correct, options.response_time).with_hint(options.hint);
        if let Some(attempts) = options.attempts {
            result = result.with_attempts(attempts);
        }

        let entry =
            self.engine
                .track_performance(&options.user, &options.subject, &descriptor, &result);

        if let Err(e) = self.engine.save() {
            return TrackOutput::failure(format!("Failed to save: {}", e));
        }

        let mastery = self.engine.mastery(&options.user, &options.subject);
        TrackOutput::success(entry, mastery)
    }

    pub fn format_output(&self, output: &TrackOutput, options: &TrackOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &TrackOutput) -> String {
        let Some(entry) = output.entry.as_ref().filter(|_| output.success) else {
            return format!(
                "Track failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let verdict = if entry.is_correct { "correct" } else { "incorrect" };
        let mut text = format!(
            "Recorded {} answer to {} ({}, {})\n",
            verdict, entry.question_id, entry.subject, entry.difficulty
        );
        if let Some(mastery) = &output.mastery {
            text.push_str(&format!(
                "Mastery: {} (score {}, streak {})\n",
                mastery.level,
                percent(mastery.score),
                mastery.streak
            ));
        }
        text
    }
}
