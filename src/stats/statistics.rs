//! Windowed statistics over a performance history.
//!
//! Every function here is a pure function of the slice it is given. The
//! slice is expected in chronological order (oldest first); "the last N
//! entries" means the tail of the slice.

use crate::core::PerformanceEntry;

/// Default window for the windowed statistics.
pub const DEFAULT_WINDOW: usize = 10;

/// Size of the sliding sub-windows used by [`consistency`].
pub const CONSISTENCY_SUBWINDOW: usize = 3;

/// Consistency reported when there are too few entries to measure it.
pub const NEUTRAL_CONSISTENCY: f64 = 0.5;

/// The last `window` entries, or all of them if there are fewer.
pub fn recent(history: &[PerformanceEntry], window: usize) -> &[PerformanceEntry] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// Fraction of correct answers among the last `window` entries.
///
/// Returns 0.0 for an empty history.
pub fn accuracy(history: &[PerformanceEntry], window: usize) -> f64 {
    let slice = recent(history, window);
    if slice.is_empty() {
        return 0.0;
    }
    correct_count(slice) as f64 / slice.len() as f64
}

/// Mean response time (ms) over the last `window` entries.
///
/// Returns 0.0 for an empty history.
pub fn average_response_time(history: &[PerformanceEntry], window: usize) -> f64 {
    let slice = recent(history, window);
    if slice.is_empty() {
        return 0.0;
    }
    let total: f64 = slice.iter().map(|e| e.response_time as f64).sum();
    total / slice.len() as f64
}

/// How stable accuracy is across short runs of recent attempts.
///
/// The last `window` entries are split into overlapping runs of three
/// (stride 1). The result is `1 - 4 * variance` of the per-run accuracies,
/// clamped to [0, 1]. Fewer than three entries yield 0.5.
pub fn consistency(history: &[PerformanceEntry], window: usize) -> f64 {
    let slice = recent(history, window);
    if slice.len() < CONSISTENCY_SUBWINDOW {
        return NEUTRAL_CONSISTENCY;
    }

    let run_accuracies: Vec<f64> = slice
        .windows(CONSISTENCY_SUBWINDOW)
        .map(|run| correct_count(run) as f64 / CONSISTENCY_SUBWINDOW as f64)
        .collect();

    let n = run_accuracies.len() as f64;
    let mean = run_accuracies.iter().sum::<f64>() / n;
    let variance = run_accuracies
        .iter()
        .map(|a| (a - mean).powi(2))
        .sum::<f64>()
        / n;

    (1.0 - 4.0 * variance).clamp(0.0, 1.0)
}

/// Consecutive correct answers ending at the most recent entry.
pub fn streak(history: &[PerformanceEntry]) -> u32 {
    history
        .iter()
        .rev()
        .take_while(|e| e.is_correct)
        .count() as u32
}

/// Longest run of consecutive correct answers anywhere in the history.
pub fn longest_streak(history: &[PerformanceEntry]) -> u32 {
    let mut longest = 0u32;
    let mut current = 0u32;
    for entry in history {
        if entry.is_correct {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn correct_count(entries: &[PerformanceEntry]) -> usize {
    entries.iter().filter(|e| e.is_correct).count()
}
