//! Stable question identity.
//!
//! Identity is resolved in priority order:
//! 1. explicit `id`
//! 2. `"{word}-{question}"` when a `word` is present
//! 3. the question text
//! 4. the answer text
//! 5. the JSON serialization of the whole descriptor
//!
//! Ids derived this way are only unique within one (user, subject) history.

use crate::core::QuestionDescriptor;

/// Resolve the identity of a question descriptor. Never fails.
pub fn question_id(descriptor: &QuestionDescriptor) -> String {
    if let Some(id) = non_empty(&descriptor.id) {
        return id.to_string();
    }

    if let Some(word) = non_empty(&descriptor.word) {
        return format!(
            "{}-{}",
            word,
            descriptor.question.as_deref().unwrap_or_default()
        );
    }

    if let Some(question) = non_empty(&descriptor.question) {
        return question.to_string();
    }

    if let Some(answer) = non_empty(&descriptor.answer) {
        return answer.to_string();
    }

    serde_json::to_string(descriptor).unwrap_or_default()
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
