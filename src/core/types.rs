//! Core data model for the adaptive learning engine.
//!
//! Wire-facing types use camelCase field names so snapshots exported by a
//! host application round-trip without a translation layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SaplingError;

/// Difficulty tier of a question.
///
/// The caller owns the active tier; the engine only suggests transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    #[serde(alias = "easy")]
    Easy,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "hard")]
    Hard,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }

    /// One tier up, saturating at `Hard`.
    pub fn harder(&self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium | Self::Hard => Self::Hard,
        }
    }

    /// One tier down, saturating at `Easy`.
    pub fn easier(&self) -> Self {
        match self {
            Self::Hard => Self::Medium,
            Self::Medium | Self::Easy => Self::Easy,
        }
    }

    /// Position on the tier ladder (0 = easy).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SaplingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Self::Easy),
            "MEDIUM" => Ok(Self::Medium),
            "HARD" => Ok(Self::Hard),
            other => Err(SaplingError::invalid_input(format!(
                "unknown difficulty '{}', expected EASY, MEDIUM or HARD",
                other
            ))),
        }
    }
}

/// Discrete mastery level derived from the mastery score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    #[default]
    Beginner,
    Developing,
    Proficient,
    Expert,
}

impl MasteryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Developing => "developing",
            Self::Proficient => "proficient",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key identifying one learner's history in one subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PerformanceKey {
    pub user_id: String,
    pub subject: String,
}

impl PerformanceKey {
    pub fn new(user_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for PerformanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.subject)
    }
}

/// One graded attempt. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    /// Filled from the enclosing snapshot key when missing on import.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub subject: String,
    /// Hosts with numeric catalog ids store them as JSON numbers.
    #[serde(deserialize_with = "required_id_from_string_or_number")]
    pub question_id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub is_correct: bool,
    /// Response time in milliseconds.
    #[serde(deserialize_with = "millis_lenient")]
    pub response_time: u64,
    /// Creation time in milliseconds (any monotonic clock).
    pub timestamp: i64,
    #[serde(default)]
    pub hint_used: bool,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_attempts() -> u32 {
    1
}

/// Accepts integer or fractional milliseconds; negative values clamp to zero.
fn millis_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value > 0.0 {
        Ok(value.round() as u64)
    } else {
        Ok(0)
    }
}

/// The result of one graded attempt, as reported by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub is_correct: bool,
    #[serde(deserialize_with = "millis_lenient")]
    pub response_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl AttemptResult {
    pub fn new(is_correct: bool, response_time: u64) -> Self {
        Self {
            is_correct,
            response_time,
            hint_used: None,
            attempts: None,
        }
    }

    pub fn correct(response_time: u64) -> Self {
        Self::new(true, response_time)
    }

    pub fn incorrect(response_time: u64) -> Self {
        Self::new(false, response_time)
    }

    pub fn with_hint(mut self, hint_used: bool) -> Self {
        self.hint_used = Some(hint_used);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Hint flag with the `false` default applied.
    pub fn hint_used(&self) -> bool {
        self.hint_used.unwrap_or(false)
    }

    /// Attempt count with the default applied; zero is not a valid count.
    pub fn attempts(&self) -> u32 {
        self.attempts.filter(|&n| n > 0).unwrap_or(1)
    }
}

/// Derived mastery for one key, always recomputed from the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySnapshot {
    pub score: f64,
    pub accuracy: f64,
    pub avg_response_time: f64,
    pub consistency: f64,
    pub streak: u32,
    pub level: MasteryLevel,
    pub last_updated: i64,
}

/// Audit record for a difficulty change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRecord {
    pub from: Difficulty,
    pub to: Difficulty,
    pub reason: String,
    pub timestamp: i64,
}

/// Study priority of a recommendation. Ordered most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A "what to study next" suggestion. Computed per call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub subject: String,
    pub priority: Priority,
    pub reason: String,
    pub recommended_difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_level: Option<MasteryLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Estimated session length in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
}

/// Direction of recent accuracy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

/// A question as supplied by a content catalog.
///
/// Only the fields the engine needs are typed; everything else is kept in
/// `extra` so the descriptor round-trips unchanged through selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionDescriptor {
    #[serde(
        default,
        deserialize_with = "id_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QuestionDescriptor {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_question(question: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            ..Self::default()
        }
    }

    pub fn word(mut self, word: impl Into<String>) -> Self {
        self.word = Some(word.into());
        self
    }

    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn required_id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {}",
            other
        ))),
    }
}
