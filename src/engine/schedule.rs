//! Maintenance scheduling.
//!
//! The engine has no timers of its own. The host polls
//! [`AdaptiveLearningEngine::run_due_maintenance`](crate::engine::AdaptiveLearningEngine::run_due_maintenance)
//! from whatever loop or timer it already has, and this schedule decides what
//! is due: one cleanup shortly after startup, then a save on a fixed interval.

use crate::config::MaintenanceConfig;

/// Check if an interval task should run.
///
/// Returns true if the task never ran or ran at least `interval_ms` ago.
pub fn should_run(last_run_ms: Option<i64>, now_ms: i64, interval_ms: i64) -> bool {
    match last_run_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) >= interval_ms,
    }
}

/// What a maintenance poll should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueTasks {
    pub cleanup: bool,
    pub save: bool,
}

impl DueTasks {
    pub fn any(&self) -> bool {
        self.cleanup || self.save
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceSchedule {
    started_ms: i64,
    cleanup_delay_ms: i64,
    save_interval_ms: i64,
    auto_save: bool,
    cleanup_done: bool,
    last_save_ms: Option<i64>,
}

impl MaintenanceSchedule {
    pub fn new(config: &MaintenanceConfig, started_ms: i64) -> Self {
        let secs_to_ms = |secs: u64| i64::try_from(secs).unwrap_or(i64::MAX / 1000) * 1000;
        Self {
            started_ms,
            cleanup_delay_ms: secs_to_ms(config.cleanup_delay_secs),
            save_interval_ms: secs_to_ms(config.save_interval_secs),
            auto_save: config.auto_save,
            cleanup_done: false,
            // the first save waits one full interval
            last_save_ms: Some(started_ms),
        }
    }

    pub fn due(&self, now_ms: i64) -> DueTasks {
        DueTasks {
            cleanup: !self.cleanup_done
                && now_ms.saturating_sub(self.started_ms) >= self.cleanup_delay_ms,
            save: self.auto_save && should_run(self.last_save_ms, now_ms, self.save_interval_ms),
        }
    }

    pub fn mark_cleanup_done(&mut self) {
        self.cleanup_done = true;
    }

    pub fn mark_saved(&mut self, now_ms: i64) {
        self.last_save_ms = Some(now_ms);
    }

    pub fn cleanup_done(&self) -> bool {
        self.cleanup_done
    }

    pub fn last_save_ms(&self) -> Option<i64> {
        self.last_save_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> MaintenanceSchedule {
        MaintenanceSchedule::new(&MaintenanceConfig::default(), 0)
    }

    #[test]
    fn test_should_run_no_previous() {
        assert!(should_run(None, 0, 60_000));
    }

    #[test]
    fn test_should_run_interval() {
        assert!(!should_run(Some(0), 59_999, 60_000));
        assert!(should_run(Some(0), 60_000, 60_000));
    }

    #[test]
    fn test_nothing_due_at_start() {
        assert!(!schedule().due(0).any());
    }

    #[test]
    fn test_cleanup_due_once_after_delay() {
        let mut s = schedule();
        assert!(!s.due(4_999).cleanup);
        assert!(s.due(5_000).cleanup);

        s.mark_cleanup_done();
        assert!(!s.due(1_000_000).cleanup);
        assert!(s.cleanup_done());
    }

    #[test]
    fn test_save_every_interval() {
        let mut s = schedule();
        assert!(!s.due(59_999).save);
        assert!(s.due(60_000).save);

        s.mark_saved(60_000);
        assert!(!s.due(100_000).save);
        assert!(s.due(120_000).save);
        assert_eq!(s.last_save_ms(), Some(60_000));
    }

    #[test]
    fn test_auto_save_disabled() {
        let config = MaintenanceConfig {
            auto_save: false,
            ..MaintenanceConfig::default()
        };
        let s = MaintenanceSchedule::new(&config, 0);
        assert!(!s.due(10_000_000).save);
        assert!(s.due(10_000_000).cleanup);
    }
}
