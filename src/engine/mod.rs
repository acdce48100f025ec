//! The adaptive learning engine.
//!
//! [`AdaptiveLearningEngine`] is the only entry point hosts call. It owns the
//! performance store, forwards attempts into it, and answers questions about
//! a learner by running the pure functions in [`crate::stats`] over a
//! consistent copy of that learner's state.
//!
//! The engine is an ordinary value: construct one per process (or per test),
//! share it behind an `Arc`, and drive maintenance from the host's own timer.

pub mod schedule;

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::{
    question_id, AdjustmentRecord, AttemptResult, Clock, Difficulty, MasterySnapshot,
    PerformanceEntry, PerformanceKey, QuestionDescriptor, Recommendation, SystemClock,
};
use crate::error::{FailOpen, Result};
use crate::stats::{self, difficulty, PerformanceAnalytics};
use crate::storage::{
    EngineSnapshot, MemorySnapshotStore, ParseReport, PerformanceStore, PruneReport,
    SnapshotStore,
};

pub use schedule::{DueTasks, MaintenanceSchedule};

/// What a maintenance poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Set when the startup cleanup ran.
    pub cleanup: Option<PruneReport>,
    /// Whether a save was attempted and succeeded.
    pub saved: bool,
}

pub struct AdaptiveLearningEngine<S: SnapshotStore = MemorySnapshotStore> {
    config: EngineConfig,
    store: PerformanceStore,
    persistence: S,
    clock: Arc<dyn Clock>,
    rng: Mutex<ChaCha8Rng>,
    schedule: Mutex<MaintenanceSchedule>,
}

impl AdaptiveLearningEngine<MemorySnapshotStore> {
    /// Engine with default configuration and no durable persistence.
    pub fn in_memory() -> Self {
        Self::new(EngineConfig::default(), MemorySnapshotStore::new())
    }
}

impl<S: SnapshotStore> AdaptiveLearningEngine<S> {
    pub fn new(config: EngineConfig, persistence: S) -> Self {
        Self::with_clock(config, persistence, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, persistence: S, clock: Arc<dyn Clock>) -> Self {
        let started = clock.now_ms();
        Self {
            store: PerformanceStore::new(config.limits()),
            schedule: Mutex::new(MaintenanceSchedule::new(&config.maintenance, started)),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
            config,
            persistence,
            clock,
        }
    }

    /// Make question selection reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn persistence(&self) -> &S {
        &self.persistence
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Record one graded attempt and return the entry as stored.
    ///
    /// Missing optional fields take their defaults (no hint, one attempt,
    /// MEDIUM difficulty) and the question id is derived from the descriptor.
    pub fn track_performance(
        &self,
        user_id: &str,
        subject: &str,
        question: &QuestionDescriptor,
        result: &AttemptResult,
    ) -> PerformanceEntry {
        let entry = PerformanceEntry {
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            question_id: question_id(question),
            difficulty: question.difficulty.unwrap_or_default(),
            is_correct: result.is_correct,
            response_time: result.response_time,
            timestamp: self.clock.now_ms(),
            hint_used: result.hint_used(),
            attempts: result.attempts(),
        };

        let stored = self.store.append(entry);
        debug!(
            user_id,
            subject,
            question_id = %stored.question_id,
            is_correct = stored.is_correct,
            response_time = stored.response_time,
            "Tracked attempt"
        );
        stored
    }

    pub fn history(&self, user_id: &str, subject: &str) -> Vec<PerformanceEntry> {
        self.store.history(&PerformanceKey::new(user_id, subject))
    }

    pub fn mastery(&self, user_id: &str, subject: &str) -> Option<MasterySnapshot> {
        self.store.mastery(&PerformanceKey::new(user_id, subject))
    }

    pub fn adjustment_log(&self, user_id: &str, subject: &str) -> Vec<AdjustmentRecord> {
        self.store.adjustments(&PerformanceKey::new(user_id, subject))
    }

    /// Display view of a learner's performance; zeroed when there is no history.
    pub fn performance_analytics(&self, user_id: &str, subject: &str) -> PerformanceAnalytics {
        self.store
            .with_state(&PerformanceKey::new(user_id, subject), |state| {
                stats::analyze(&state.history, state.mastery.as_ref())
            })
            .unwrap_or_default()
    }

    /// Suggest the next tier for a learner currently on `current`.
    ///
    /// Returns `current` unchanged when there is no history. An actual change
    /// is appended to the adjustment log.
    pub fn adjust_difficulty(&self, user_id: &str, subject: &str, current: Difficulty) -> Difficulty {
        let key = PerformanceKey::new(user_id, subject);
        let now = self.clock.now_ms();
        let record = self.store.record_adjustment_with(&key, |state| {
            let transition = difficulty::evaluate(state.mastery.as_ref()?, current)?;
            Some(AdjustmentRecord {
                from: transition.from,
                to: transition.to,
                reason: transition.reason.to_string(),
                timestamp: now,
            })
        });

        let Some(record) = record else {
            return current;
        };
        info!(
            user_id,
            subject,
            from = %record.from,
            to = %record.to,
            reason = %record.reason,
            "Adjusted difficulty"
        );
        record.to
    }

    /// Pick up to `count` questions from `pool`, avoiding recently asked ones.
    pub fn select_questions(
        &self,
        user_id: &str,
        subject: &str,
        pool: &[QuestionDescriptor],
        count: usize,
    ) -> Vec<QuestionDescriptor> {
        let window = self.config.selection.recent_window;
        let recent = self
            .store
            .with_state(&PerformanceKey::new(user_id, subject), |state| {
                stats::recent_question_ids(&state.history, window)
            })
            .unwrap_or_default();

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        stats::select_questions(pool, &recent, count, &mut *rng)
    }

    /// Rank `subjects` by what the learner should study next.
    pub fn recommend_learning_path<T: AsRef<str>>(
        &self,
        user_id: &str,
        subjects: &[T],
    ) -> Vec<Recommendation> {
        let recommendations = subjects
            .iter()
            .map(|subject| {
                let subject = subject.as_ref();
                let (snapshot, last_difficulty) = self
                    .store
                    .with_state(&PerformanceKey::new(user_id, subject), |state| {
                        (
                            state.mastery.clone(),
                            state.history.last().map(|e| e.difficulty),
                        )
                    })
                    .unwrap_or((None, None));
                stats::recommend(subject, snapshot.as_ref(), last_difficulty)
            })
            .collect();

        stats::rank_recommendations(recommendations)
    }

    pub fn export_snapshot(&self) -> EngineSnapshot {
        self.store.export(self.clock.now_ms())
    }

    /// Replace all state with a decoded export. Never fails; malformed parts
    /// are skipped and counted in the report.
    pub fn import_snapshot(&self, data: &Value) -> ParseReport {
        let (snapshot, report) = EngineSnapshot::from_value_lenient(data);
        self.store.import(snapshot);
        report
    }

    pub fn import_json(&self, json: &str) -> ParseReport {
        let (snapshot, report) = EngineSnapshot::from_json_lenient(json);
        self.store.import(snapshot);
        report
    }

    /// Drop entries and adjustment records older than `max_age_ms`.
    pub fn prune_older_than(&self, max_age_ms: i64) -> PruneReport {
        let cutoff = self.clock.now_ms().saturating_sub(max_age_ms);
        self.store.prune_before(cutoff)
    }

    /// Forget one (user, subject). Returns whether anything was stored.
    pub fn reset(&self, user_id: &str, subject: &str) -> bool {
        let removed = self.store.remove(&PerformanceKey::new(user_id, subject));
        if removed {
            info!(user_id, subject, "Reset learner progress");
        }
        removed
    }

    /// Forget every subject for a user. Returns the number of subjects removed.
    pub fn reset_user(&self, user_id: &str) -> usize {
        let removed = self.store.remove_user(user_id);
        if removed > 0 {
            info!(user_id, subjects = removed, "Reset learner progress");
        }
        removed
    }

    pub fn tracked_keys(&self) -> Vec<PerformanceKey> {
        self.store.keys()
    }

    /// Write the current state to the persistence collaborator.
    pub fn save(&self) -> Result<()> {
        let json = self.export_snapshot().to_json()?;
        self.persistence.save(&json)?;
        info!(keys = self.store.len(), bytes = json.len(), "Saved engine state");
        Ok(())
    }

    /// Replace the current state with whatever the collaborator has saved.
    ///
    /// Returns `false` when nothing was saved, leaving the state untouched.
    pub fn load(&self) -> Result<bool> {
        let Some(json) = self.persistence.load()? else {
            return Ok(false);
        };
        let report = self.import_json(&json);
        info!(
            keys = self.store.len(),
            clean = report.is_clean(),
            "Loaded engine state"
        );
        Ok(true)
    }

    /// Run whatever maintenance is due. Failures are logged, never returned.
    pub fn run_due_maintenance(&self) -> MaintenanceReport {
        let now = self.clock.now_ms();
        let mut schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        let due = schedule.due(now);
        let mut report = MaintenanceReport::default();
        if !due.any() {
            return report;
        }

        if due.cleanup {
            let max_age = self.config.maintenance.max_age().num_milliseconds();
            report.cleanup = Some(self.prune_older_than(max_age));
            schedule.mark_cleanup_done();
        }

        if due.save {
            report.saved = self
                .save()
                .map(|_| true)
                .fail_open_with("scheduled save", false);
            // a failed save waits for the next interval rather than retrying every poll
            schedule.mark_saved(now);
        }

        report
    }
}
