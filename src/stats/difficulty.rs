//! Difficulty adjustment.
//!
//! A three-state machine over EASY / MEDIUM / HARD driven by the current
//! mastery snapshot. Rules are evaluated in order:
//!
//! 1. Escalate: accuracy >= 0.85, avg response <= 3000 ms and streak >= 5.
//! 2. De-escalate: accuracy <= 0.64 or avg response >= 6001 ms. HARD always
//!    drops to MEDIUM; MEDIUM drops to EASY only when accuracy < 0.50.
//! 3. Hold.
//!
//! A single decision never moves more than one tier.

use crate::core::{Difficulty, MasterySnapshot};

/// Decision thresholds.
pub mod thresholds {
    pub const ESCALATE_ACCURACY: f64 = 0.85;
    pub const ESCALATE_STREAK: u32 = 5;
    pub const FAST_RESPONSE_MS: f64 = 3000.0;
    pub const STRUGGLE_ACCURACY: f64 = 0.64;
    pub const SLOW_RESPONSE_MS: f64 = 6001.0;
    /// Below this, a MEDIUM learner drops to EASY.
    pub const DROP_TO_EASY_ACCURACY: f64 = 0.50;
}

/// Human-readable reasons recorded with each adjustment.
pub mod reasons {
    pub const READY_FOR_CHALLENGE: &str = "High accuracy and streak - ready for challenge";
    pub const NEED_PRACTICE: &str = "Low accuracy - need more practice";
    pub const BUILD_CONFIDENCE: &str = "Slow responses - reducing difficulty to build confidence";
    pub const GENERIC: &str = "Performance-based adjustment";
}

/// A suggested change of tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Difficulty,
    pub to: Difficulty,
    pub reason: &'static str,
}

pub fn is_fast(avg_response_time_ms: f64) -> bool {
    avg_response_time_ms <= thresholds::FAST_RESPONSE_MS
}

pub fn is_slow(avg_response_time_ms: f64) -> bool {
    avg_response_time_ms >= thresholds::SLOW_RESPONSE_MS
}

pub fn is_struggling(accuracy: f64) -> bool {
    accuracy <= thresholds::STRUGGLE_ACCURACY
}

fn ready_to_escalate(snapshot: &MasterySnapshot) -> bool {
    snapshot.accuracy >= thresholds::ESCALATE_ACCURACY
        && is_fast(snapshot.avg_response_time)
        && snapshot.streak >= thresholds::ESCALATE_STREAK
}

/// The tier the learner should be on next.
pub fn decide(snapshot: &MasterySnapshot, current: Difficulty) -> Difficulty {
    if ready_to_escalate(snapshot) {
        return current.harder();
    }

    if is_struggling(snapshot.accuracy) || is_slow(snapshot.avg_response_time) {
        return match current {
            Difficulty::Hard => current.easier(),
            Difficulty::Medium if snapshot.accuracy < thresholds::DROP_TO_EASY_ACCURACY => {
                current.easier()
            }
            Difficulty::Medium | Difficulty::Easy => current,
        };
    }

    current
}

/// Like [`decide`], but only returns a value when the tier actually changes.
pub fn evaluate(snapshot: &MasterySnapshot, current: Difficulty) -> Option<Transition> {
    let to = decide(snapshot, current);
    (to != current).then(|| Transition {
        from: current,
        to,
        reason: reason_for(snapshot),
    })
}

fn reason_for(snapshot: &MasterySnapshot) -> &'static str {
    if snapshot.accuracy >= thresholds::ESCALATE_ACCURACY
        && snapshot.streak >= thresholds::ESCALATE_STREAK
    {
        reasons::READY_FOR_CHALLENGE
    } else if is_struggling(snapshot.accuracy) {
        reasons::NEED_PRACTICE
    } else if is_slow(snapshot.avg_response_time) {
        reasons::BUILD_CONFIDENCE
    } else {
        reasons::GENERIC
    }
}
