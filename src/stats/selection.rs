//! Question selection biased away from recently seen items.
//!
//! Questions whose identity appears in the learner's recent history are only
//! used to top up the selection once the unseen ones run out.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::{question_id, PerformanceEntry, QuestionDescriptor};
use crate::stats::statistics;

/// Number of recent entries whose questions count as "recently asked".
pub const DEFAULT_RECENT_WINDOW: usize = 20;

/// Question ids among the last `window` entries.
pub fn recent_question_ids(history: &[PerformanceEntry], window: usize) -> HashSet<String> {
    statistics::recent(history, window)
        .iter()
        .map(|e| e.question_id.clone())
        .collect()
}

/// Pick up to `count` questions, preferring ones not in `recent`.
///
/// Both groups are shuffled independently, so the result is unseen questions
/// in random order followed, if needed, by recently seen ones in random order.
/// An empty pool yields an empty selection.
pub fn select<R: Rng + ?Sized>(
    pool: &[QuestionDescriptor],
    recent: &HashSet<String>,
    count: usize,
    rng: &mut R,
) -> Vec<QuestionDescriptor> {
    if pool.is_empty() || count == 0 {
        return Vec::new();
    }

    let (mut fresh, mut seen): (Vec<&QuestionDescriptor>, Vec<&QuestionDescriptor>) = pool
        .iter()
        .partition(|q| !recent.contains(&question_id(q)));

    fresh.shuffle(rng);
    let mut selected: Vec<QuestionDescriptor> = fresh.into_iter().take(count).cloned().collect();

    if selected.len() < count {
        seen.shuffle(rng);
        let remaining = count - selected.len();
        selected.extend(seen.into_iter().take(remaining).cloned());
    }

    selected
}
