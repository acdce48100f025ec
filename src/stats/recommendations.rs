//! Learning path recommendations.
//!
//! Each subject is classified from its mastery snapshot:
//!
//! - no history → **high**, start on EASY
//! - accuracy <= 0.64 → **high**, needs more practice
//! - expert with a streak of 10+ → **low**, well mastered
//! - developing → **medium**, difficulty from the adjuster
//! - anything else → **medium**, continue practicing
//!
//! The list is ordered by priority, then by ascending accuracy so the
//! weakest subject within a priority band comes first.

use std::cmp::Ordering;

use crate::core::{Difficulty, MasteryLevel, MasterySnapshot, Priority, Recommendation};
use crate::stats::difficulty;

/// Recommendation reasons.
pub mod reasons {
    pub const NEW_SUBJECT: &str = "New subject - start with the basics";
    pub const NEEDS_PRACTICE: &str = "Accuracy is low - needs more practice";
    pub const WELL_MASTERED: &str = "Well mastered - occasional review is enough";
    pub const GOOD_PROGRESS: &str = "Good progress - keep building skills";
    pub const CONTINUE: &str = "Continue practicing to reach the next level";
}

/// Streak an expert needs before a subject is considered well mastered.
pub const MASTERED_STREAK: u32 = 10;

/// Session length suggested for a subject with no history.
pub const NEW_SUBJECT_MINUTES: u32 = 10;

/// Questions per suggested session.
pub const QUESTIONS_PER_SESSION: f64 = 10.0;

/// Minutes per question for a learner at `level`.
pub fn base_minutes_per_question(level: MasteryLevel) -> f64 {
    match level {
        MasteryLevel::Beginner => 1.0,
        MasteryLevel::Developing => 0.75,
        MasteryLevel::Proficient => 0.5,
        MasteryLevel::Expert => 0.33,
    }
}

/// Multiplier applied for slow or fast responders.
pub fn response_time_factor(avg_response_time_ms: f64) -> f64 {
    if difficulty::is_slow(avg_response_time_ms) {
        1.5
    } else if difficulty::is_fast(avg_response_time_ms) {
        0.8
    } else {
        1.0
    }
}

/// Estimated session length in whole minutes.
pub fn estimated_minutes(level: MasteryLevel, avg_response_time_ms: f64) -> u32 {
    let minutes = base_minutes_per_question(level)
        * response_time_factor(avg_response_time_ms)
        * QUESTIONS_PER_SESSION;
    minutes.round() as u32
}

/// Build the recommendation for one subject.
///
/// `last_difficulty` is the tier of the most recent attempt, used as the
/// starting point when asking the adjuster for a developing learner.
pub fn recommend(
    subject: &str,
    snapshot: Option<&MasterySnapshot>,
    last_difficulty: Option<Difficulty>,
) -> Recommendation {
    let Some(snapshot) = snapshot else {
        return Recommendation {
            subject: subject.to_string(),
            priority: Priority::High,
            reason: reasons::NEW_SUBJECT.to_string(),
            recommended_difficulty: Difficulty::Easy,
            mastery_level: None,
            accuracy: None,
            estimated_time: Some(NEW_SUBJECT_MINUTES),
        };
    };

    let (priority, reason, recommended_difficulty) = if difficulty::is_struggling(snapshot.accuracy)
    {
        (Priority::High, reasons::NEEDS_PRACTICE, Difficulty::Easy)
    } else if snapshot.level == MasteryLevel::Expert && snapshot.streak >= MASTERED_STREAK {
        (Priority::Low, reasons::WELL_MASTERED, Difficulty::Hard)
    } else if snapshot.level == MasteryLevel::Developing {
        let current = last_difficulty.unwrap_or_default();
        (
            Priority::Medium,
            reasons::GOOD_PROGRESS,
            difficulty::decide(snapshot, current),
        )
    } else {
        (Priority::Medium, reasons::CONTINUE, Difficulty::Medium)
    };

    Recommendation {
        subject: subject.to_string(),
        priority,
        reason: reason.to_string(),
        recommended_difficulty,
        mastery_level: Some(snapshot.level),
        accuracy: Some(snapshot.accuracy),
        estimated_time: Some(estimated_minutes(
            snapshot.level,
            snapshot.avg_response_time,
        )),
    }
}

/// Order recommendations by priority, then ascending accuracy.
///
/// Subjects without an accuracy (new subjects) sort first within their band.
pub fn rank(mut recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| compare_accuracy(a.accuracy, b.accuracy))
    });
    recommendations
}

fn compare_accuracy(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}
