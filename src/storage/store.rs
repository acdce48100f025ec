//! In-memory performance store.
//!
//! State is held per (user, subject) key. Each key has its own `RwLock`, so
//! writes to one key never wait on another key, and readers always see a
//! history together with the mastery snapshot computed from it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::core::{AdjustmentRecord, MasterySnapshot, PerformanceEntry, PerformanceKey};
use crate::stats::mastery::{self, MasteryWindows};
use crate::storage::snapshot::EngineSnapshot;

/// Bounds and windows the store enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Maximum entries per history; the oldest are evicted first.
    pub max_entries: usize,
    /// Maximum adjustment records per key.
    pub max_adjustments: usize,
    pub mastery: MasteryWindows,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_adjustments: 20,
            mastery: MasteryWindows::default(),
        }
    }
}

/// Everything the engine knows about one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyState {
    /// Chronological, capped at `max_entries`.
    pub history: Vec<PerformanceEntry>,
    /// Recomputed on every append; `None` only when the history is empty.
    pub mastery: Option<MasterySnapshot>,
    /// Capped at `max_adjustments`.
    pub adjustments: Vec<AdjustmentRecord>,
}

impl KeyState {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.mastery.is_none() && self.adjustments.is_empty()
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: KeyState,
    /// Set once the slot has been removed from the map. Writers that raced
    /// the removal must look the key up again.
    retired: bool,
}

type SharedSlot = Arc<RwLock<Slot>>;

/// Summary of an age-based prune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub entries_removed: usize,
    pub adjustments_removed: usize,
    pub keys_removed: usize,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.entries_removed == 0 && self.adjustments_removed == 0 && self.keys_removed == 0
    }
}

/// Thread-safe store of per-key learning state.
#[derive(Debug, Default)]
pub struct PerformanceStore {
    limits: StoreLimits,
    slots: RwLock<HashMap<PerformanceKey, SharedSlot>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl PerformanceStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            limits,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    fn slot(&self, key: &PerformanceKey) -> Option<SharedSlot> {
        read(&self.slots).get(key).cloned()
    }

    fn slot_or_create(&self, key: &PerformanceKey) -> SharedSlot {
        if let Some(slot) = self.slot(key) {
            return slot;
        }
        write(&self.slots)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Run `f` against a live (non-retired) slot for `key`, creating it if needed.
    fn with_slot_mut<R>(&self, key: &PerformanceKey, f: impl FnOnce(&mut KeyState) -> R) -> R {
        let mut f = Some(f);
        loop {
            let slot = self.slot_or_create(key);
            let mut guard = write(&slot);
            if guard.retired {
                continue;
            }
            // The loop only repeats when the closure has not been taken.
            if let Some(f) = f.take() {
                return f(&mut guard.state);
            }
        }
    }

    /// Append an entry to its key's history.
    ///
    /// The timestamp is clamped so the history stays non-decreasing, the
    /// oldest entries are evicted past `max_entries`, and the mastery
    /// snapshot is recomputed. Returns the entry as stored.
    pub fn append(&self, mut entry: PerformanceEntry) -> PerformanceEntry {
        let key = PerformanceKey::new(entry.user_id.clone(), entry.subject.clone());
        let limits = self.limits;

        self.with_slot_mut(&key, |state| {
            if let Some(last) = state.history.last() {
                entry.timestamp = entry.timestamp.max(last.timestamp);
            }
            state.history.push(entry.clone());

            let excess = state.history.len().saturating_sub(limits.max_entries);
            if excess > 0 {
                state.history.drain(..excess);
            }

            state.mastery = mastery::compute(&state.history, limits.mastery, entry.timestamp);

            if let Some(snapshot) = &state.mastery {
                debug!(
                    key = %key,
                    entries = state.history.len(),
                    score = snapshot.score,
                    level = %snapshot.level,
                    "Recomputed mastery"
                );
            }

            entry
        })
    }

    /// Decide on and append an adjustment record under the key's write lock.
    ///
    /// `decide` sees the state the record is appended to, so nothing can
    /// change between the decision and the append. Keys that are not stored
    /// are never created. Only the newest `max_adjustments` records are kept.
    pub fn record_adjustment_with(
        &self,
        key: &PerformanceKey,
        decide: impl FnOnce(&KeyState) -> Option<AdjustmentRecord>,
    ) -> Option<AdjustmentRecord> {
        let slot = self.slot(key)?;
        let mut guard = write(&slot);
        if guard.retired {
            return None;
        }

        let record = decide(&guard.state)?;
        let adjustments = &mut guard.state.adjustments;
        adjustments.push(record.clone());
        let excess = adjustments.len().saturating_sub(self.limits.max_adjustments);
        if excess > 0 {
            adjustments.drain(..excess);
        }
        Some(record)
    }

    /// Read a key's state under its lock without cloning it.
    pub fn with_state<R>(&self, key: &PerformanceKey, f: impl FnOnce(&KeyState) -> R) -> Option<R> {
        let slot = self.slot(key)?;
        let guard = read(&slot);
        if guard.retired {
            return None;
        }
        Some(f(&guard.state))
    }

    /// Consistent copy of a key's state.
    pub fn state(&self, key: &PerformanceKey) -> Option<KeyState> {
        self.with_state(key, KeyState::clone)
    }

    pub fn history(&self, key: &PerformanceKey) -> Vec<PerformanceEntry> {
        self.with_state(key, |s| s.history.clone())
            .unwrap_or_default()
    }

    pub fn mastery(&self, key: &PerformanceKey) -> Option<MasterySnapshot> {
        self.with_state(key, |s| s.mastery.clone()).flatten()
    }

    pub fn adjustments(&self, key: &PerformanceKey) -> Vec<AdjustmentRecord> {
        self.with_state(key, |s| s.adjustments.clone())
            .unwrap_or_default()
    }

    /// All keys with stored state, sorted.
    pub fn keys(&self) -> Vec<PerformanceKey> {
        let mut keys: Vec<PerformanceKey> = read(&self.slots).keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        read(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.slots).is_empty()
    }

    /// Forget one key. Returns whether it existed.
    pub fn remove(&self, key: &PerformanceKey) -> bool {
        let removed = write(&self.slots).remove(key);
        match removed {
            Some(slot) => {
                write(&slot).retired = true;
                true
            }
            None => false,
        }
    }

    /// Forget every key belonging to `user_id`. Returns the number removed.
    pub fn remove_user(&self, user_id: &str) -> usize {
        let mut slots = write(&self.slots);
        let keys: Vec<PerformanceKey> = slots
            .keys()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();

        for key in &keys {
            if let Some(slot) = slots.remove(key) {
                write(&slot).retired = true;
            }
        }
        keys.len()
    }

    pub fn clear(&self) {
        let drained: Vec<SharedSlot> = write(&self.slots).drain().map(|(_, s)| s).collect();
        for slot in drained {
            write(&slot).retired = true;
        }
    }

    /// Drop entries and adjustment records with a timestamp before `cutoff_ms`.
    ///
    /// Keys whose history and adjustment log both end up empty are removed
    /// entirely. Mastery is recomputed for every key that lost entries.
    pub fn prune_before(&self, cutoff_ms: i64) -> PruneReport {
        let mut report = PruneReport::default();
        let limits = self.limits;
        let mut slots = write(&self.slots);

        slots.retain(|key, slot| {
            let mut guard = write(slot);
            let state = &mut guard.state;

            let before = state.history.len();
            state.history.retain(|e| e.timestamp >= cutoff_ms);
            let removed = before - state.history.len();
            report.entries_removed += removed;

            let before = state.adjustments.len();
            state.adjustments.retain(|r| r.timestamp >= cutoff_ms);
            report.adjustments_removed += before - state.adjustments.len();

            if removed > 0 {
                let now = state.history.last().map(|e| e.timestamp).unwrap_or(cutoff_ms);
                state.mastery = mastery::compute(&state.history, limits.mastery, now);
            }

            let keep = !(state.history.is_empty() && state.adjustments.is_empty());
            if !keep {
                guard.retired = true;
                report.keys_removed += 1;
                debug!(key = %key, "Pruned key with no remaining data");
            }
            keep
        });

        if !report.is_empty() {
            info!(
                entries_removed = report.entries_removed,
                adjustments_removed = report.adjustments_removed,
                keys_removed = report.keys_removed,
                cutoff_ms,
                "Pruned old performance data"
            );
        }

        report
    }

    /// Copy all state into the export wire format.
    pub fn export(&self, exported_at: i64) -> EngineSnapshot {
        let mut snapshot = EngineSnapshot {
            exported_at,
            ..EngineSnapshot::default()
        };

        let slots: Vec<(PerformanceKey, SharedSlot)> = read(&self.slots)
            .iter()
            .map(|(k, s)| (k.clone(), Arc::clone(s)))
            .collect();

        for (key, slot) in slots {
            let guard = read(&slot);
            if guard.retired {
                continue;
            }
            let state = &guard.state;

            if !state.history.is_empty() {
                snapshot
                    .performance_history
                    .entry(key.user_id.clone())
                    .or_default()
                    .insert(key.subject.clone(), state.history.clone());
            }
            if let Some(mastery) = &state.mastery {
                snapshot
                    .mastery_levels
                    .entry(key.user_id.clone())
                    .or_default()
                    .insert(key.subject.clone(), mastery.clone());
            }
            if !state.adjustments.is_empty() {
                snapshot
                    .difficulty_adjustments
                    .entry(key.user_id.clone())
                    .or_default()
                    .insert(key.subject.clone(), state.adjustments.clone());
            }
        }

        snapshot
    }

    /// Replace all state with the contents of `snapshot`.
    ///
    /// Entries take their user and subject from the snapshot keys, histories
    /// are re-sorted and capped, and mastery is recomputed wherever it is
    /// missing or the history had to be changed. Returns the number of keys
    /// loaded.
    pub fn import(&self, snapshot: EngineSnapshot) -> usize {
        let limits = self.limits;
        let mut states: HashMap<PerformanceKey, KeyState> = HashMap::new();
        let mut truncated: Vec<PerformanceKey> = Vec::new();

        for (user_id, subjects) in snapshot.performance_history {
            for (subject, mut history) in subjects {
                if history.is_empty() {
                    continue;
                }
                for entry in &mut history {
                    entry.user_id = user_id.clone();
                    entry.subject = subject.clone();
                }
                history.sort_by_key(|e| e.timestamp);
                let key = PerformanceKey::new(user_id.clone(), subject);
                let excess = history.len().saturating_sub(limits.max_entries);
                if excess > 0 {
                    history.drain(..excess);
                    truncated.push(key.clone());
                }

                states.entry(key).or_default().history = history;
            }
        }

        for (user_id, subjects) in snapshot.mastery_levels {
            for (subject, mastery) in subjects {
                let key = PerformanceKey::new(user_id.clone(), subject);
                states.entry(key).or_default().mastery = Some(mastery);
            }
        }

        for (user_id, subjects) in snapshot.difficulty_adjustments {
            for (subject, mut records) in subjects {
                if records.is_empty() {
                    continue;
                }
                let excess = records.len().saturating_sub(limits.max_adjustments);
                if excess > 0 {
                    records.drain(..excess);
                }
                let key = PerformanceKey::new(user_id.clone(), subject);
                states.entry(key).or_default().adjustments = records;
            }
        }

        for (key, state) in states.iter_mut() {
            if state.history.is_empty() {
                continue;
            }
            if state.mastery.is_none() || truncated.contains(key) {
                let now = state.history.last().map(|e| e.timestamp).unwrap_or_default();
                state.mastery = mastery::compute(&state.history, limits.mastery, now);
            }
        }

        let count = states.len();
        let fresh: HashMap<PerformanceKey, SharedSlot> = states
            .into_iter()
            .map(|(key, state)| {
                let slot = Slot {
                    state,
                    retired: false,
                };
                (key, Arc::new(RwLock::new(slot)))
            })
            .collect();

        let old = std::mem::replace(&mut *write(&self.slots), fresh);
        for slot in old.into_values() {
            write(&slot).retired = true;
        }

        info!(keys = count, "Imported performance snapshot");
        count
    }
}
