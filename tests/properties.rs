//! Property tests for the statistics and the adjuster.

use proptest::prelude::*;

use sapling::stats::{difficulty, mastery, statistics};
use sapling::{
    AdaptiveLearningEngine, AttemptResult, Difficulty, MasteryLevel, MasterySnapshot,
    PerformanceEntry, QuestionDescriptor,
};

fn entry(is_correct: bool, response_time: u64, timestamp: i64) -> PerformanceEntry {
    PerformanceEntry {
        user_id: "u".to_string(),
        subject: "s".to_string(),
        question_id: format!("q{}", timestamp),
        difficulty: Difficulty::Medium,
        is_correct,
        response_time,
        timestamp,
        hint_used: false,
        attempts: 1,
    }
}

fn history_strategy() -> impl Strategy<Value = Vec<PerformanceEntry>> {
    prop::collection::vec((any::<bool>(), 0u64..60_000), 0..60).prop_map(|attempts| {
        attempts
            .into_iter()
            .enumerate()
            .map(|(i, (ok, rt))| entry(ok, rt, i as i64))
            .collect()
    })
}

fn difficulty_strategy() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

fn snapshot_strategy() -> impl Strategy<Value = MasterySnapshot> {
    (0.0f64..=1.0, 0.0f64..20_000.0, 0.0f64..=1.0, 0u32..30).prop_map(
        |(accuracy, avg, consistency, streak)| MasterySnapshot {
            score: mastery::score(accuracy, avg, consistency, streak),
            accuracy,
            avg_response_time: avg,
            consistency,
            streak,
            level: MasteryLevel::Developing,
            last_updated: 0,
        },
    )
}

proptest! {
    #[test]
    fn accuracy_is_a_fraction(history in history_strategy(), window in 1usize..40) {
        let a = statistics::accuracy(&history, window);
        prop_assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn consistency_is_a_fraction(history in history_strategy(), window in 1usize..40) {
        let c = statistics::consistency(&history, window);
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn streak_counts_trailing_correct(history in history_strategy()) {
        let trailing = history.iter().rev().take_while(|e| e.is_correct).count() as u32;
        prop_assert_eq!(statistics::streak(&history), trailing);
        prop_assert!(statistics::longest_streak(&history) >= trailing);
    }

    #[test]
    fn mastery_score_is_bounded(history in history_strategy()) {
        match mastery::compute(&history, mastery::MasteryWindows::default(), 0) {
            Some(snapshot) => {
                prop_assert!(snapshot.score >= 0.0 && snapshot.score <= 1.0 + 1e-9);
                prop_assert_eq!(snapshot.level, mastery::level_for(snapshot.score));
            }
            None => prop_assert!(history.is_empty()),
        }
    }

    #[test]
    fn difficulty_moves_at_most_one_step(
        snapshot in snapshot_strategy(),
        current in difficulty_strategy(),
    ) {
        let next = difficulty::decide(&snapshot, current);
        let step = (next.rank() as i32 - current.rank() as i32).abs();
        prop_assert!(step <= 1);
    }

    #[test]
    fn export_import_round_trips_history(
        attempts in prop::collection::vec((any::<bool>(), 0u64..30_000), 1..30),
    ) {
        let source = AdaptiveLearningEngine::in_memory();
        for (i, (ok, rt)) in attempts.iter().enumerate() {
            source.track_performance(
                "u",
                "s",
                &QuestionDescriptor::with_id(format!("q{}", i)),
                &AttemptResult::new(*ok, *rt),
            );
        }

        let json = source.export_snapshot().to_json().unwrap();
        let target = AdaptiveLearningEngine::in_memory();
        prop_assert!(target.import_json(&json).is_clean());
        prop_assert_eq!(target.history("u", "s"), source.history("u", "s"));
    }
}
