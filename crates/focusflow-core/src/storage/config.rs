//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session duration defaults and allowed range
//! - Completion hold and paused-resize behaviour
//! - Record mode (leaderboard or history), award and caps
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/focusflow/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::records::{RecordLimits, RecordMode};
use crate::timer::{DurationLimits, PausedResize, TimerOptions, DEFAULT_DURATION_SECS};

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_duration_min")]
    pub default_duration_min: u32,
    #[serde(default = "default_min_duration")]
    pub min_duration_min: u32,
    #[serde(default = "default_max_duration")]
    pub max_duration_min: u32,
    /// Time the display stays at 00:00 after a session completes.
    #[serde(default = "default_completion_hold_ms")]
    pub completion_hold_ms: u64,
    #[serde(default)]
    pub paused_resize: PausedResize,
}

/// Session record configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSettings {
    #[serde(default)]
    pub mode: RecordMode,
    #[serde(default = "default_points_award")]
    pub points_award: u64,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_toast_ms")]
    pub completion_duration_ms: u64,
    #[serde(default = "default_toast_ms")]
    pub error_duration_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusflow/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub records: RecordSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

// Default functions
fn default_duration_min() -> u32 {
    DEFAULT_DURATION_SECS / 60
}
fn default_min_duration() -> u32 {
    1
}
fn default_max_duration() -> u32 {
    120
}
fn default_completion_hold_ms() -> u64 {
    1500
}
fn default_points_award() -> u64 {
    25
}
fn default_leaderboard_size() -> usize {
    crate::records::LEADERBOARD_SIZE
}
fn default_history_size() -> usize {
    crate::records::HISTORY_SIZE
}
fn default_true() -> bool {
    true
}
fn default_toast_ms() -> u64 {
    5000
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_duration_min: default_duration_min(),
            min_duration_min: default_min_duration(),
            max_duration_min: default_max_duration(),
            completion_hold_ms: default_completion_hold_ms(),
            paused_resize: PausedResize::default(),
        }
    }
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            mode: RecordMode::default(),
            points_award: default_points_award(),
            leaderboard_size: default_leaderboard_size(),
            history_size: default_history_size(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            completion_duration_ms: default_toast_ms(),
            error_duration_ms: default_toast_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot assign to a section".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation,
    /// or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Change a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// into the field's type, or the result fails validation. The config is
    /// unchanged on error.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timer;
        if t.min_duration_min == 0 || t.min_duration_min > t.max_duration_min {
            return Err(ConfigError::InvalidValue {
                key: "timer.min_duration_min".into(),
                message: format!(
                    "must be between 1 and timer.max_duration_min ({})",
                    t.max_duration_min
                ),
            });
        }
        if !(t.min_duration_min..=t.max_duration_min).contains(&t.default_duration_min) {
            return Err(ConfigError::InvalidValue {
                key: "timer.default_duration_min".into(),
                message: format!(
                    "must be within {}..={} minutes",
                    t.min_duration_min, t.max_duration_min
                ),
            });
        }
        if self.records.leaderboard_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "records.leaderboard_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.records.history_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "records.history_size".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn duration_limits(&self) -> DurationLimits {
        DurationLimits::from_minutes(self.timer.min_duration_min, self.timer.max_duration_min)
    }

    pub fn default_duration_secs(&self) -> u32 {
        self.timer.default_duration_min.saturating_mul(60)
    }

    pub fn timer_options(&self) -> TimerOptions {
        TimerOptions {
            limits: self.duration_limits(),
            completion_hold: Duration::from_millis(self.timer.completion_hold_ms),
            paused_resize: self.timer.paused_resize,
        }
    }

    pub fn record_limits(&self) -> RecordLimits {
        RecordLimits {
            leaderboard_size: self.records.leaderboard_size,
            history_size: self.records.history_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_timer_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.default_duration_secs(), DEFAULT_DURATION_SECS);
        assert_eq!(cfg.timer_options(), TimerOptions::default());
    }

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.timer.default_duration_min, 25);
        assert_eq!(cfg.timer.min_duration_min, 1);
        assert_eq!(cfg.timer.max_duration_min, 120);
        assert_eq!(cfg.timer.completion_hold_ms, 1500);
        assert_eq!(cfg.timer.paused_resize, PausedResize::Rebase);
        assert_eq!(cfg.records.mode, RecordMode::Leaderboard);
        assert_eq!(cfg.records.points_award, 25);
        assert_eq!(cfg.records.leaderboard_size, 10);
        assert_eq!(cfg.records.history_size, 20);
        assert!(cfg.notifications.enabled);
        assert_eq!(cfg.notifications.completion_duration_ms, 5000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[records]\nmode = \"history\"\n").unwrap();
        assert_eq!(cfg.records.mode, RecordMode::History);
        assert_eq!(cfg.records.points_award, 25);
        assert_eq!(cfg.timer.default_duration_min, 25);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.default_duration_min").as_deref(), Some("25"));
        assert_eq!(cfg.get("records.mode").as_deref(), Some("leaderboard"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn update_changes_typed_values() {
        let mut cfg = Config::default();
        cfg.update("timer.default_duration_min", "50").unwrap();
        cfg.update("records.mode", "history").unwrap();
        cfg.update("timer.paused_resize", "preserve-elapsed").unwrap();
        cfg.update("notifications.enabled", "false").unwrap();

        assert_eq!(cfg.timer.default_duration_min, 50);
        assert_eq!(cfg.records.mode, RecordMode::History);
        assert_eq!(cfg.timer.paused_resize, PausedResize::PreserveElapsed);
        assert!(!cfg.notifications.enabled);
    }

    #[test]
    fn update_rejects_bad_input_and_keeps_config() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.update("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.update("notifications.enabled", "not_a_bool").is_err());
        assert!(cfg.update("records.mode", "podium").is_err());
        assert!(cfg.update("timer", "5").is_err());
        assert!(cfg.update("timer.default_duration_min", "500").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn derived_options_follow_settings() {
        let mut cfg = Config::default();
        cfg.update("timer.completion_hold_ms", "0").unwrap();
        let opts = cfg.timer_options();
        assert_eq!(opts.limits, DurationLimits::new(60, 7200));
        assert_eq!(opts.completion_hold, Duration::ZERO);
        assert_eq!(cfg.default_duration_secs(), 1500);
        assert_eq!(cfg.record_limits(), RecordLimits::default());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.update("records.points_award", "40").unwrap();
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap().records.points_award, 40);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
