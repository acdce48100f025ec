//! Export/import wire format.
//!
//! ```json
//! {
//!   "performanceHistory":    { "<user>": { "<subject>": [entry, ...] } },
//!   "masteryLevels":         { "<user>": { "<subject>": snapshot } },
//!   "difficultyAdjustments": { "<user>": { "<subject>": [record, ...] } },
//!   "exportedAt": 1700000000000
//! }
//! ```
//!
//! Parsing is lenient: every section, user, subject and list item is read
//! independently and anything malformed is skipped with a warning. A
//! snapshot that is not even JSON parses to an empty snapshot.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::{AdjustmentRecord, MasterySnapshot, PerformanceEntry};
use crate::error::{Result, SaplingError};

/// Values nested by user id, then subject.
pub type UserSubjectMap<T> = BTreeMap<String, BTreeMap<String, T>>;

pub const HISTORY_SECTION: &str = "performanceHistory";
pub const MASTERY_SECTION: &str = "masteryLevels";
pub const ADJUSTMENTS_SECTION: &str = "difficultyAdjustments";
pub const EXPORTED_AT_FIELD: &str = "exportedAt";

/// Serializable copy of the whole engine state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub performance_history: UserSubjectMap<Vec<PerformanceEntry>>,
    pub mastery_levels: UserSubjectMap<MasterySnapshot>,
    pub difficulty_adjustments: UserSubjectMap<Vec<AdjustmentRecord>>,
    /// Export time in milliseconds; 0 when unknown.
    #[serde(default)]
    pub exported_at: i64,
}

/// Counts of what a lenient parse had to drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub skipped_sections: usize,
    pub skipped_keys: usize,
    pub skipped_items: usize,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_sections == 0 && self.skipped_keys == 0 && self.skipped_items == 0
    }
}

impl EngineSnapshot {
    /// Parse a JSON string, degrading to an empty snapshot on invalid JSON.
    pub fn from_json_lenient(json: &str) -> (Self, ParseReport) {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::from_value_lenient(&value),
            Err(e) => {
                warn!(error = %e, "Snapshot is not valid JSON (fail-open: importing nothing)");
                let report = ParseReport {
                    skipped_sections: 3,
                    ..ParseReport::default()
                };
                (Self::default(), report)
            }
        }
    }

    /// Parse an already-decoded JSON value section by section.
    pub fn from_value_lenient(value: &Value) -> (Self, ParseReport) {
        let mut report = ParseReport::default();

        let Some(root) = value.as_object() else {
            warn!("Snapshot root is not an object (fail-open: importing nothing)");
            report.skipped_sections = 3;
            return (Self::default(), report);
        };

        let performance_history = parse_section(
            root.get(HISTORY_SECTION),
            HISTORY_SECTION,
            &mut report,
            parse_list::<PerformanceEntry>,
        );
        let mastery_levels = parse_section(
            root.get(MASTERY_SECTION),
            MASTERY_SECTION,
            &mut report,
            parse_one::<MasterySnapshot>,
        );
        let difficulty_adjustments = parse_section(
            root.get(ADJUSTMENTS_SECTION),
            ADJUSTMENTS_SECTION,
            &mut report,
            parse_list::<AdjustmentRecord>,
        );
        let exported_at = root
            .get(EXPORTED_AT_FIELD)
            .and_then(Value::as_i64)
            .unwrap_or(0);

        if !report.is_clean() {
            warn!(
                skipped_sections = report.skipped_sections,
                skipped_keys = report.skipped_keys,
                skipped_items = report.skipped_items,
                "Snapshot contained malformed data that was skipped"
            );
        }

        (
            Self {
                performance_history,
                mastery_levels,
                difficulty_adjustments,
                exported_at,
            },
            report,
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(encode_error)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(encode_error)
    }

    /// Number of (user, subject) histories.
    pub fn history_count(&self) -> usize {
        self.performance_history.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.performance_history.is_empty()
            && self.mastery_levels.is_empty()
            && self.difficulty_adjustments.is_empty()
    }
}

/// Parse one `{user: {subject: T}}` section.
///
/// A missing section is simply empty; a section of the wrong shape counts
/// as skipped.
fn parse_section<T>(
    section: Option<&Value>,
    name: &str,
    report: &mut ParseReport,
    parse: fn(&Value, &mut ParseReport) -> Option<T>,
) -> UserSubjectMap<T> {
    let mut out = UserSubjectMap::new();

    let Some(section) = section else {
        return out;
    };
    let Some(users) = section.as_object() else {
        warn!(section = name, "Snapshot section is not an object, skipping");
        report.skipped_sections += 1;
        return out;
    };

    for (user_id, subjects) in users {
        let Some(subjects) = subjects.as_object() else {
            report.skipped_keys += 1;
            continue;
        };
        for (subject, raw) in subjects {
            match parse(raw, report) {
                Some(value) => {
                    out.entry(user_id.clone())
                        .or_default()
                        .insert(subject.clone(), value);
                }
                None => report.skipped_keys += 1,
            }
        }
    }

    out
}

fn parse_one<T: DeserializeOwned>(raw: &Value, _report: &mut ParseReport) -> Option<T> {
    serde_json::from_value(raw.clone()).ok()
}

/// Parse a list item by item, dropping only the malformed items.
fn parse_list<T: DeserializeOwned>(raw: &Value, report: &mut ParseReport) -> Option<Vec<T>> {
    let items = raw.as_array()?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value(item.clone()) {
            Ok(value) => out.push(value),
            Err(_) => report.skipped_items += 1,
        }
    }
    Some(out)
}

fn encode_error(e: serde_json::Error) -> SaplingError {
    SaplingError::serde(format!("encoding snapshot: {}", e))
}
