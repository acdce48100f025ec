//! Select command: pick the next questions from a pool file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::render;
use crate::core::{question_id, QuestionDescriptor};
use crate::engine::AdaptiveLearningEngine;
use crate::error::{Result, SaplingError};
use crate::storage::SnapshotStore;
use crate::util::read_to_string_limited;

#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub json: bool,
    pub quiet: bool,
    pub user: String,
    pub subject: String,
    /// JSON file holding an array of question descriptors.
    pub pool: PathBuf,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOutput {
    pub success: bool,
    pub pool_size: usize,
    pub selected: Vec<QuestionDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SelectOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            pool_size: 0,
            selected: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub struct SelectCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> SelectCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &SelectOptions) -> SelectOutput {
        let pool = match Self::read_pool(&options.pool) {
            Ok(pool) => pool,
            Err(e) => return SelectOutput::failure(e.to_string()),
        };

        let selected =
            self.engine
                .select_questions(&options.user, &options.subject, &pool, options.count);

        SelectOutput {
            success: true,
            pool_size: pool.len(),
            selected,
            error: None,
        }
    }

    fn read_pool(path: &std::path::Path) -> Result<Vec<QuestionDescriptor>> {
        let content = read_to_string_limited(path)?;
        serde_json::from_str(&content).map_err(|e| {
            SaplingError::invalid_input(format!(
                "{} is not a JSON array of questions: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn format_output(&self, output: &SelectOutput, options: &SelectOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &SelectOutput) -> String {
        if !output.success {
            return format!(
                "Select failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.selected.is_empty() {
            return "No questions available.\n".to_string();
        }

        let mut lines = vec![format!(
            "Selected {} of {} question(s):",
            output.selected.len(),
            output.pool_size
        )];
        for q in &output.selected {
            lines.push(format!("  {}", question_id(q)));
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttemptResult;
    use std::fs;
    use tempfile::TempDir;

    fn write_pool(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("pool.json");
        fs::write(&path, content).unwrap();
        path
    }

    fn options(pool: PathBuf, count: usize) -> SelectOptions {
        SelectOptions {
            user: "kid".to_string(),
            subject: "math".to_string(),
            pool,
            count,
            ..SelectOptions::default()
        }
    }

    #[test]
    fn test_select_skips_recent() {
        let dir = TempDir::new().unwrap();
        let pool = write_pool(
            &dir,
            r#"[{"id": 1, "question": "1+1"}, {"id": 2}, {"word": "cat", "question": "Spell"}]"#,
        );

        let engine = AdaptiveLearningEngine::in_memory().with_seed(9);
        for id in ["1", "2"] {
            engine.track_performance(
                "kid",
                "math",
                &QuestionDescriptor::with_id(id),
                &AttemptResult::correct(1000),
            );
        }

        let cmd = SelectCommand::new(&engine);
        let output = cmd.run(&options(pool, 1));
        assert!(output.success);
        assert_eq!(output.pool_size, 3);
        assert_eq!(question_id(&output.selected[0]), "cat-Spell");

        let text = cmd.format_output(&output, &options(PathBuf::new(), 1));
        assert!(text.contains("Selected 1 of 3"));
        assert!(text.contains("  cat-Spell"));
    }

    #[test]
    fn test_select_bad_pool() {
        let dir = TempDir::new().unwrap();
        let engine = AdaptiveLearningEngine::in_memory();
        let cmd = SelectCommand::new(&engine);

        let missing = cmd.run(&options(dir.path().join("missing.json"), 2));
        assert!(!missing.success);

        let bad = cmd.run(&options(write_pool(&dir, r#"{"id": 1}"#), 2));
        assert!(!bad.success);
        assert!(bad.error.unwrap().contains("not a JSON array"));
    }

    #[test]
    fn test_empty_pool() {
        let dir = TempDir::new().unwrap();
        let engine = AdaptiveLearningEngine::in_memory();
        let cmd = SelectCommand::new(&engine);

        let output = cmd.run(&options(write_pool(&dir, "[]"), 3));
        assert!(output.success);
        assert!(output.selected.is_empty());
        assert_eq!(
            cmd.format_output(&output, &options(PathBuf::new(), 3)),
            "No questions available.\n"
        );
    }
}
