//! Learner-facing performance analytics.
//!
//! Turns a history and its mastery snapshot into the display-ready view the
//! UI reads: percentages as integers, response time in whole seconds.

use serde::{Deserialize, Serialize};

use crate::core::{Difficulty, MasteryLevel, MasterySnapshot, PerformanceEntry, Trend};
use crate::stats::statistics;

/// Window for the "recent" side of the trend comparison.
pub const TREND_RECENT_WINDOW: usize = 5;
/// Window for the "older" side of the trend comparison.
pub const TREND_OLDER_WINDOW: usize = 10;
/// Accuracy delta beyond which a trend is reported.
pub const TREND_THRESHOLD: f64 = 0.1;

/// Minimum attempts on a tier before it can be a strong or weak area.
pub const AREA_MIN_ATTEMPTS: usize = 3;
pub const STRONG_AREA_ACCURACY: f64 = 0.8;
pub const WEAK_AREA_ACCURACY: f64 = 0.6;

/// Display view of one learner's performance in one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalytics {
    pub total_attempts: usize,
    /// Percentage, 0-100.
    pub accuracy: u32,
    /// Whole seconds.
    pub average_response_time: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub mastery_level: MasteryLevel,
    /// Percentage, 0-100.
    pub mastery_score: u32,
    pub recent_trend: Trend,
    pub strong_areas: Vec<Difficulty>,
    pub improvement_areas: Vec<Difficulty>,
    /// Percentage, 0-100.
    pub consistency: u32,
    /// Percentage of attempts where a hint was used, 0-100.
    pub hint_usage_rate: u32,
}

impl Default for PerformanceAnalytics {
    fn default() -> Self {
        Self {
            total_attempts: 0,
            accuracy: 0,
            average_response_time: 0,
            current_streak: 0,
            longest_streak: 0,
            mastery_level: MasteryLevel::Beginner,
            mastery_score: 0,
            recent_trend: Trend::Stable,
            strong_areas: Vec::new(),
            improvement_areas: Vec::new(),
            consistency: 0,
            hint_usage_rate: 0,
        }
    }
}

/// Build the analytics view.
///
/// Without a snapshot (no history yet) the zeroed default view is returned.
pub fn analyze(
    history: &[PerformanceEntry],
    snapshot: Option<&MasterySnapshot>,
) -> PerformanceAnalytics {
    let Some(snapshot) = snapshot else {
        return PerformanceAnalytics {
            total_attempts: history.len(),
            ..PerformanceAnalytics::default()
        };
    };

    let (strong_areas, improvement_areas) = areas(history);

    PerformanceAnalytics {
        total_attempts: history.len(),
        accuracy: percent(snapshot.accuracy),
        average_response_time: (snapshot.avg_response_time / 1000.0).round().max(0.0) as u64,
        current_streak: snapshot.streak,
        longest_streak: statistics::longest_streak(history),
        mastery_level: snapshot.level,
        mastery_score: percent(snapshot.score),
        recent_trend: trend(history),
        strong_areas,
        improvement_areas,
        consistency: percent(snapshot.consistency),
        hint_usage_rate: hint_usage_rate(history),
    }
}

/// Compare the last five attempts against the five before them.
///
/// The older figure is the ten-entry accuracy minus the five-entry accuracy,
/// kept exactly as shipped so existing dashboards keep their readings.
pub fn trend(history: &[PerformanceEntry]) -> Trend {
    let recent = statistics::accuracy(history, TREND_RECENT_WINDOW);
    let older = statistics::accuracy(history, TREND_OLDER_WINDOW) - recent;
    let delta = recent - older;

    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Split difficulty tiers into strong and improvement areas by accuracy.
fn areas(history: &[PerformanceEntry]) -> (Vec<Difficulty>, Vec<Difficulty>) {
    let mut strong = Vec::new();
    let mut weak = Vec::new();

    for tier in Difficulty::ALL {
        let attempts: Vec<&PerformanceEntry> =
            history.iter().filter(|e| e.difficulty == tier).collect();
        if attempts.len() < AREA_MIN_ATTEMPTS {
            continue;
        }

        let correct = attempts.iter().filter(|e| e.is_correct).count();
        let accuracy = correct as f64 / attempts.len() as f64;
        if accuracy >= STRONG_AREA_ACCURACY {
            strong.push(tier);
        } else if accuracy < WEAK_AREA_ACCURACY {
            weak.push(tier);
        }
    }

    (strong, weak)
}

fn hint_usage_rate(history: &[PerformanceEntry]) -> u32 {
    if history.is_empty() {
        return 0;
    }
    let hinted = history.iter().filter(|e| e.hint_used).count();
    percent(hinted as f64 / history.len() as f64)
}

fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u32
}
