//! Configuration loading for Sapling.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.sapling/config.toml`)
//! 3. User config (`~/.sapling/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! Everything is optional. Scoring weights and difficulty thresholds are not
//! configuration: they are fixed so that every host scores learners the same
//! way. Only windows, capacities and maintenance timing can be tuned.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Duration;

use crate::error::{Result, SaplingError};
use crate::stats::mastery::MasteryWindows;
use crate::storage::StoreLimits;
use crate::util::read_to_string_limited;

/// Main configuration struct for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub mastery: MasteryConfig,
    pub selection: SelectionConfig,
    pub maintenance: MaintenanceConfig,
    pub storage: StorageConfig,
}

/// Per-key capacity limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Entries kept per (user, subject); the oldest are evicted first.
    pub max_entries: usize,
    /// Difficulty adjustment records kept per (user, subject).
    pub max_adjustments: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_adjustments: 20,
        }
    }
}

/// Windows used when recomputing mastery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MasteryConfig {
    pub accuracy_window: usize,
    pub response_time_window: usize,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        let windows = MasteryWindows::default();
        Self {
            accuracy_window: windows.accuracy,
            response_time_window: windows.response_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Entries whose questions count as recently asked.
    pub recent_window: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { recent_window: 20 }
    }
}

/// Background save and cleanup timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub save_interval_secs: u64,
    /// Delay after startup before the one-shot cleanup runs.
    pub cleanup_delay_secs: u64,
    /// Entries older than this are pruned by cleanup.
    pub max_age_days: u32,
    /// Whether maintenance saves to the persistence collaborator.
    pub auto_save: bool,
}

impl MaintenanceConfig {
    pub fn max_age(&self) -> Duration {
        Duration::days(i64::from(self.max_age_days))
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            save_interval_secs: 60,
            cleanup_delay_secs: 5,
            max_age_days: 30,
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot file; `$SAPLING_HOME/snapshot.json` when unset.
    pub snapshot_path: Option<PathBuf>,
}

fn is_positive(value: usize) -> bool {
    value > 0
}

impl EngineConfig {
    /// Load configuration with the full precedence chain, relative to the
    /// current directory.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = EngineConfig::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = EngineConfig::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    fn load_user_config() -> Option<EngineConfig> {
        let path = sapling_home()?.join("config.toml");
        Self::load_layer(&path)
    }

    fn load_project_config(cwd: &Path) -> Option<EngineConfig> {
        let path = project_sapling_dir(cwd).join("config.toml");
        Self::load_layer(&path)
    }

    /// A missing file is silently skipped; an unreadable or invalid one is
    /// skipped with a warning.
    fn load_layer(path: &Path) -> Option<EngineConfig> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring config file");
                None
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<EngineConfig> {
        let content = read_to_string_limited(path)?;
        toml::from_str(&content).map_err(|e| SaplingError::config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        env_override("SAPLING_MAX_ENTRIES", &mut self.history.max_entries, |n| {
            is_positive(*n)
        });
        env_override(
            "SAPLING_SAVE_INTERVAL_SECS",
            &mut self.maintenance.save_interval_secs,
            |n| *n > 0,
        );
        env_override(
            "SAPLING_MAX_AGE_DAYS",
            &mut self.maintenance.max_age_days,
            |n| *n > 0,
        );

        if let Ok(val) = env::var("SAPLING_AUTO_SAVE") {
            self.maintenance.auto_save = val == "true" || val == "1";
        }

        if let Ok(val) = env::var("SAPLING_SNAPSHOT_PATH") {
            if val.is_empty() {
                tracing::warn!("SAPLING_SNAPSHOT_PATH is empty, ignoring");
            } else {
                self.storage.snapshot_path = Some(PathBuf::from(val));
            }
        }
    }

    /// Layer `other` over `self`, field by field.
    ///
    /// A field is taken from `other` when it differs from the default and is
    /// valid. A layer therefore cannot set a value back to its default to undo
    /// a lower layer.
    fn merge(mut self, other: EngineConfig) -> Self {
        let defaults = EngineConfig::default();

        take_if_set(
            &mut self.history.max_entries,
            other.history.max_entries,
            defaults.history.max_entries,
            "history.max_entries",
        );
        take_if_set(
            &mut self.history.max_adjustments,
            other.history.max_adjustments,
            defaults.history.max_adjustments,
            "history.max_adjustments",
        );
        take_if_set(
            &mut self.mastery.accuracy_window,
            other.mastery.accuracy_window,
            defaults.mastery.accuracy_window,
            "mastery.accuracy_window",
        );
        take_if_set(
            &mut self.mastery.response_time_window,
            other.mastery.response_time_window,
            defaults.mastery.response_time_window,
            "mastery.response_time_window",
        );
        take_if_set(
            &mut self.selection.recent_window,
            other.selection.recent_window,
            defaults.selection.recent_window,
            "selection.recent_window",
        );
        take_if_set(
            &mut self.maintenance.save_interval_secs,
            other.maintenance.save_interval_secs,
            defaults.maintenance.save_interval_secs,
            "maintenance.save_interval_secs",
        );
        take_if_set(
            &mut self.maintenance.max_age_days,
            other.maintenance.max_age_days,
            defaults.maintenance.max_age_days,
            "maintenance.max_age_days",
        );

        // zero is a valid cleanup delay
        if other.maintenance.cleanup_delay_secs != defaults.maintenance.cleanup_delay_secs {
            self.maintenance.cleanup_delay_secs = other.maintenance.cleanup_delay_secs;
        }
        if other.maintenance.auto_save != defaults.maintenance.auto_save {
            self.maintenance.auto_save = other.maintenance.auto_save;
        }
        if other.storage.snapshot_path.is_some() {
            self.storage.snapshot_path = other.storage.snapshot_path;
        }

        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("history.max_entries", self.history.max_entries),
            ("history.max_adjustments", self.history.max_adjustments),
            ("mastery.accuracy_window", self.mastery.accuracy_window),
            ("mastery.response_time_window", self.mastery.response_time_window),
            ("selection.recent_window", self.selection.recent_window),
        ];
        for (name, value) in bounds {
            if !is_positive(value) {
                return Err(SaplingError::config(format!("{} must be at least 1", name)));
            }
        }
        if self.maintenance.save_interval_secs == 0 {
            return Err(SaplingError::config(
                "maintenance.save_interval_secs must be at least 1",
            ));
        }
        if self.maintenance.max_age_days == 0 {
            return Err(SaplingError::config(
                "maintenance.max_age_days must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_entries: self.history.max_entries,
            max_adjustments: self.history.max_adjustments,
            mastery: MasteryWindows {
                accuracy: self.mastery.accuracy_window,
                response_time: self.mastery.response_time_window,
            },
        }
    }

    /// Configured snapshot path, falling back to the default location.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.storage
            .snapshot_path
            .clone()
            .or_else(default_snapshot_path)
    }
}

/// Apply `name` from the environment when it parses and passes `valid`.
fn env_override<T>(name: &str, target: &mut T, valid: impl Fn(&T) -> bool)
where
    T: FromStr + Display,
{
    let Ok(val) = env::var(name) else {
        return;
    };
    match val.parse::<T>() {
        Ok(n) if valid(&n) => *target = n,
        Ok(_) | Err(_) => tracing::warn!(
            variable = name,
            value = %val,
            current = %target,
            "Invalid environment override, keeping current value"
        ),
    }
}

fn take_if_set<T>(target: &mut T, value: T, default: T, name: &str)
where
    T: PartialEq + Default + Display,
{
    if value == default {
        return;
    }
    if value == T::default() {
        tracing::warn!(
            field = name,
            value = %value,
            "Invalid config value, keeping lower layer"
        );
        return;
    }
    *target = value;
}

/// Get the Sapling home directory.
///
/// `SAPLING_HOME` wins when set and non-empty; otherwise `~/.sapling`.
pub fn sapling_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SAPLING_HOME") {
        if home.is_empty() {
            tracing::warn!("SAPLING_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("SAPLING_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".sapling"));
    }

    let fallback = env::temp_dir().join("sapling");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

/// `<sapling_home>/snapshot.json`.
pub fn default_snapshot_path() -> Option<PathBuf> {
    sapling_home().map(|h| h.join("snapshot.json"))
}

/// The `.sapling/` directory of the nearest ancestor that has one, or of
/// `cwd` itself.
pub fn project_sapling_dir(cwd: &Path) -> PathBuf {
    cwd.ancestors()
        .find(|a| a.join(".sapling").is_dir())
        .unwrap_or(cwd)
        .join(".sapling")
}
