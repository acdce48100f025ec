//! Export and import commands: move engine state in and out as JSON.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::render;
use crate::engine::AdaptiveLearningEngine;
use crate::error::SaplingError;
use crate::storage::{EngineSnapshot, SnapshotStore};
use crate::util::read_to_string_limited;

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub json: bool,
    pub quiet: bool,
    /// Write here instead of printing the snapshot.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutput {
    pub success: bool,
    pub histories: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<EngineSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            histories: 0,
            path: None,
            snapshot: None,
            error: Some(error.into()),
        }
    }
}

pub struct ExportCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> ExportCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &ExportOptions) -> ExportOutput {
        let snapshot = self.engine.export_snapshot();
        let histories = snapshot.history_count();

        let Some(path) = &options.output else {
            return ExportOutput {
                success: true,
                histories,
                path: None,
                snapshot: Some(snapshot),
                error: None,
            };
        };

        let written = snapshot.to_json_pretty().and_then(|json| {
            fs::write(path, json).map_err(|e| SaplingError::storage(path, e))
        });
        if let Err(e) = written {
            return ExportOutput::failure(e.to_string());
        }

        ExportOutput {
            success: true,
            histories,
            path: Some(path.clone()),
            snapshot: None,
            error: None,
        }
    }

    pub fn format_output(&self, output: &ExportOutput, options: &ExportOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &ExportOutput) -> String {
        if !output.success {
            return format!(
                "Export failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        match (&output.path, &output.snapshot) {
            (Some(path), _) => format!(
                "Exported {} histor{} to {}\n",
                output.histories,
                if output.histories == 1 { "y" } else { "ies" },
                path.display()
            ),
            (None, Some(snapshot)) => snapshot
                .to_json_pretty()
                .map(|json| json + "\n")
                .unwrap_or_default(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub json: bool,
    pub quiet: bool,
    pub input: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutput {
    pub success: bool,
    pub keys: usize,
    pub skipped_sections: usize,
    pub skipped_keys: usize,
    pub skipped_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            keys: 0,
            skipped_sections: 0,
            skipped_keys: 0,
            skipped_items: 0,
            error: Some(error.into()),
        }
    }
}

pub struct ImportCommand<'a, S: SnapshotStore> {
    engine: &'a AdaptiveLearningEngine<S>,
}

impl<'a, S: SnapshotStore> ImportCommand<'a, S> {
    pub fn new(engine: &'a AdaptiveLearningEngine<S>) -> Self {
        Self { engine }
    }

    /// Replace all state with the file's contents and save it.
    pub fn run(&self, options: &ImportOptions) -> ImportOutput {
        let content = match read_to_string_limited(&options.input) {
            Ok(c) => c,
            Err(e) => return ImportOutput::failure(e.to_string()),
        };

        let report = self.engine.import_json(&content);
        if let Err(e) = self.engine.save() {
            return ImportOutput::failure(format!("Failed to save: {}", e));
        }

        ImportOutput {
            success: true,
            keys: self.engine.tracked_keys().len(),
            skipped_sections: report.skipped_sections,
            skipped_keys: report.skipped_keys,
            skipped_items: report.skipped_items,
            error: None,
        }
    }

    pub fn format_output(&self, output: &ImportOutput, options: &ImportOptions) -> String {
        render(output, options.json, options.quiet, Self::format_human_readable)
    }

    fn format_human_readable(output: &ImportOutput) -> String {
        if !output.success {
            return format!(
                "Import failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut text = format!("Imported {} learner/subject key(s)\n", output.keys);
        let skipped = output.skipped_sections + output.skipped_keys + output.skipped_items;
        if skipped > 0 {
            text.push_str(&format!(
                "Skipped malformed data: {} section(s), {} key(s), {} item(s)\n",
                output.skipped_sections, output.skipped_keys, output.skipped_items
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttemptResult, QuestionDescriptor};
    use tempfile::TempDir;

    fn engine_with_data() -> AdaptiveLearningEngine {
        let engine = AdaptiveLearningEngine::in_memory();
        for subject in ["math", "reading"] {
            engine.track_performance(
                "kid",
                subject,
                &QuestionDescriptor::with_id("q1"),
                &AttemptResult::correct(2000),
            );
        }
        engine
    }

    #[test]
    fn test_export_to_stdout() {
        let engine = engine_with_data();
        let cmd = ExportCommand::new(&engine);
        let options = ExportOptions::default();

        let output = cmd.run(&options);
        assert_eq!(output.histories, 2);
        let text = cmd.format_output(&output, &options);
        assert!(text.contains("\"performanceHistory\""));
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");

        let source = engine_with_data();
        let export = ExportCommand::new(&source);
        let options = ExportOptions {
            output: Some(path.clone()),
            ..ExportOptions::default()
        };
        let output = export.run(&options);
        assert!(output.success);
        assert!(export
            .format_output(&output, &options)
            .starts_with("Exported 2 histories to"));

        let target = AdaptiveLearningEngine::in_memory();
        let import = ImportCommand::new(&target);
        let options = ImportOptions {
            input: path,
            ..ImportOptions::default()
        };
        let output = import.run(&options);
        assert!(output.success);
        assert_eq!(output.keys, 2);
        assert_eq!(target.persistence().save_count(), 1);
        assert_eq!(
            target.history("kid", "math"),
            source.history("kid", "math")
        );
        assert_eq!(
            import.format_output(&output, &options),
            "Imported 2 learner/subject key(s)\n"
        );
    }

    #[test]
    fn test_import_reports_skipped_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"performanceHistory": [], "masteryLevels": {"kid": 3}}"#).unwrap();

        let engine = AdaptiveLearningEngine::in_memory();
        let cmd = ImportCommand::new(&engine);
        let options = ImportOptions {
            input: path,
            ..ImportOptions::default()
        };
        let output = cmd.run(&options);
        assert!(output.success);
        assert_eq!(output.keys, 0);
        assert_eq!(output.skipped_sections, 1);
        assert_eq!(output.skipped_keys, 1);
        assert!(cmd.format_output(&output, &options).contains("Skipped malformed data"));
    }

    #[test]
    fn test_import_missing_file() {
        let engine = AdaptiveLearningEngine::in_memory();
        let output = ImportCommand::new(&engine).run(&ImportOptions {
            input: PathBuf::from("/nonexistent/export.json"),
            ..ImportOptions::default()
        });
        assert!(!output.success);
    }
}
