//! Mastery scoring.
//!
//! The mastery score is a weighted blend of four signals:
//! - accuracy: 0.4
//! - speed (linear decay to zero at 10 s): 0.3
//! - consistency: 0.2
//! - streak (capped at 10): 0.1

use crate::core::{MasteryLevel, MasterySnapshot, PerformanceEntry};
use crate::stats::statistics;

/// Score weights.
pub mod weights {
    pub const ACCURACY: f64 = 0.4;
    pub const SPEED: f64 = 0.3;
    pub const CONSISTENCY: f64 = 0.2;
    pub const STREAK: f64 = 0.1;
}

/// Minimum score for each level.
pub mod levels {
    pub const EXPERT: f64 = 0.90;
    pub const PROFICIENT: f64 = 0.75;
    pub const DEVELOPING: f64 = 0.60;
}

/// Response time (ms) at which the speed score reaches zero.
pub const SPEED_FLOOR_MS: f64 = 10_000.0;

/// Streak length that earns the full streak score.
pub const STREAK_CAP: f64 = 10.0;

/// Windows used when recomputing a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasteryWindows {
    /// Entries considered for accuracy and consistency.
    pub accuracy: usize,
    /// Entries considered for average response time.
    pub response_time: usize,
}

impl Default for MasteryWindows {
    fn default() -> Self {
        Self {
            accuracy: 20,
            response_time: 15,
        }
    }
}

pub fn speed_score(avg_response_time_ms: f64) -> f64 {
    (1.0 - avg_response_time_ms / SPEED_FLOOR_MS).clamp(0.0, 1.0)
}

pub fn streak_score(streak: u32) -> f64 {
    (streak as f64 / STREAK_CAP).min(1.0)
}

/// Combine the four signals into a score in [0, 1].
pub fn score(accuracy: f64, avg_response_time_ms: f64, consistency: f64, streak: u32) -> f64 {
    weights::ACCURACY * accuracy
        + weights::SPEED * speed_score(avg_response_time_ms)
        + weights::CONSISTENCY * consistency
        + weights::STREAK * streak_score(streak)
}

pub fn level_for(score: f64) -> MasteryLevel {
    if score >= levels::EXPERT {
        MasteryLevel::Expert
    } else if score >= levels::PROFICIENT {
        MasteryLevel::Proficient
    } else if score >= levels::DEVELOPING {
        MasteryLevel::Developing
    } else {
        MasteryLevel::Beginner
    }
}

/// Recompute the mastery snapshot from a full history.
///
/// Returns `None` for an empty history: there is nothing to be masterful at.
pub fn compute(
    history: &[PerformanceEntry],
    windows: MasteryWindows,
    now_ms: i64,
) -> Option<MasterySnapshot> {
    if history.is_empty() {
        return None;
    }

    let accuracy = statistics::accuracy(history, windows.accuracy);
    let avg_response_time = statistics::average_response_time(history, windows.response_time);
    let consistency = statistics::consistency(history, windows.accuracy);
    let streak = statistics::streak(history);
    let score = score(accuracy, avg_response_time, consistency, streak);

    Some(MasterySnapshot {
        score,
        accuracy,
        avg_response_time,
        consistency,
        streak,
        level: level_for(score),
        last_updated: now_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::statistics::fixtures::history;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_speed_score_decay() {
        assert!(approx(speed_score(0.0), 1.0));
        assert!(approx(speed_score(2500.0), 0.75));
        assert!(approx(speed_score(10_000.0), 0.0));
        assert!(approx(speed_score(25_000.0), 0.0));
    }

    #[test]
    fn test_streak_score_caps() {
        assert!(approx(streak_score(0), 0.0));
        assert!(approx(streak_score(5), 0.5));
        assert!(approx(streak_score(10), 1.0));
        assert!(approx(streak_score(40), 1.0));
    }

    #[test]
    fn test_score_weights() {
        assert!(approx(score(1.0, 0.0, 1.0, 10), 1.0));
        assert!(approx(score(0.0, 10_000.0, 0.0, 0), 0.0));
        // 0.4 * 0.5 + 0.3 * 0.5 + 0.2 * 0.5 + 0.1 * 0.5
        assert!(approx(score(0.5, 5000.0, 0.5, 5), 0.5));
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(level_for(0.90), MasteryLevel::Expert);
        assert_eq!(level_for(0.8999), MasteryLevel::Proficient);
        assert_eq!(level_for(0.75), MasteryLevel::Proficient);
        assert_eq!(level_for(0.60), MasteryLevel::Developing);
        assert_eq!(level_for(0.5999), MasteryLevel::Beginner);
        assert_eq!(level_for(0.0), MasteryLevel::Beginner);
    }

    #[test]
    fn test_compute_empty_is_none() {
        assert!(compute(&[], MasteryWindows::default(), 0).is_none());
    }

    #[test]
    fn test_compute_all_correct_fast() {
        let h = history(&[true; 15], 1000);
        let snapshot = compute(&h, MasteryWindows::default(), 99).unwrap();

        assert!(approx(snapshot.accuracy, 1.0));
        assert!(approx(snapshot.avg_response_time, 1000.0));
        assert!(approx(snapshot.consistency, 1.0));
        assert_eq!(snapshot.streak, 15);
        // 0.4 + 0.27 + 0.2 + 0.1
        assert!(approx(snapshot.score, 0.97));
        assert_eq!(snapshot.level, MasteryLevel::Expert);
        assert_eq!(snapshot.last_updated, 99);
    }

    #[test]
    fn test_compute_respects_windows() {
        // 20 wrong then 20 right: accuracy window 20 sees only correct answers
        let mut outcomes = vec![false; 20];
        outcomes.extend(vec![true; 20]);
        let h = history(&outcomes, 2000);

        let snapshot = compute(&h, MasteryWindows::default(), 0).unwrap();
        assert!(approx(snapshot.accuracy, 1.0));

        let wide = MasteryWindows {
            accuracy: 40,
            response_time: 40,
        };
        let snapshot = compute(&h, wide, 0).unwrap();
        assert!(approx(snapshot.accuracy, 0.5));
    }
}
