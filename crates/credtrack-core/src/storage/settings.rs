//! TOML-based notification settings.
//!
//! Stores the user-configurable scheduling rules:
//! - Master on/off switch
//! - Per-category day-offset intervals (cycle, license)
//! - Event reminder lead time
//! - Daily quiet-hours window
//!
//! Settings are stored at `~/.config/credtrack/settings.toml`. Malformed
//! values are rejected at save time so they never reach the engine.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::SettingsError;

/// Per-category reminder configuration.
///
/// Intervals are day counts before a deadline, deduplicated by the set;
/// order is irrelevant for computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_intervals")]
    pub interval_days: BTreeSet<u32>,
}

/// Event reminder configuration: a single lead-time offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_event_interval")]
    pub default_interval_days: u32,
}

/// Daily do-not-disturb window in local "HH:MM" times.
///
/// `start_time > end_time` means the window wraps past midnight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHoursConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_quiet_start")]
    pub start_time: String,
    #[serde(default = "default_quiet_end")]
    pub end_time: String,
}

impl QuietHoursConfig {
    /// Parsed window, or `None` when disabled, malformed, or zero-length.
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        if !self.enabled {
            return None;
        }
        let start = NaiveTime::parse_from_str(&self.start_time, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(&self.end_time, "%H:%M").ok()?;
        if start == end {
            return None;
        }
        Some((start, end))
    }
}

/// Notification scheduling settings.
///
/// Serialized to/from TOML at `~/.config/credtrack/settings.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Master switch. When false, the desired set is empty and every
    /// scheduled reminder gets cancelled on the next refresh.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub cycle_reminders: CategoryConfig,
    #[serde(default)]
    pub license_reminders: CategoryConfig,
    #[serde(default)]
    pub event_reminders: EventRemindersConfig,
    #[serde(default)]
    pub quiet_hours: QuietHoursConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_intervals() -> BTreeSet<u32> {
    [90, 60, 30, 14, 7, 1].into_iter().collect()
}
fn default_event_interval() -> u32 {
    1
}
fn default_quiet_start() -> String {
    "22:00".into()
}
fn default_quiet_end() -> String {
    "07:00".into()
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_days: default_intervals(),
        }
    }
}

impl Default for EventRemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_interval_days: default_event_interval(),
        }
    }
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: default_quiet_start(),
            end_time: default_quiet_end(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cycle_reminders: CategoryConfig::default(),
            license_reminders: CategoryConfig::default(),
            event_reminders: EventRemindersConfig::default(),
            quiet_hours: QuietHoursConfig::default(),
        }
    }
}

impl NotificationSettings {
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
    ) -> Result<(), SettingsError> {
        let unknown_key = || SettingsError::InvalidValue {
            key: key.to_string(),
            message: "unknown settings key".to_string(),
        };
        let bad_value = |message: String| SettingsError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown_key());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown_key)?;
                let existing = obj.get(part).ok_or_else(unknown_key)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| bad_value(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| bad_value(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) => serde_json::from_str(value)
                        .map_err(|e| bad_value(e.to_string()))?,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown_key)?;
        }

        Err(unknown_key())
    }

    fn path() -> Result<PathBuf, SettingsError> {
        let dir = data_dir().map_err(|e| SettingsError::LoadFailed {
            path: PathBuf::from("~/.config/credtrack"),
            message: e.to_string(),
        })?;
        Ok(dir.join("settings.toml"))
    }

    /// Check every field the engine depends on.
    ///
    /// # Errors
    /// Returns `InvalidValue` for a malformed quiet-hours time string.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (key, value) in [
            ("quiet_hours.start_time", &self.quiet_hours.start_time),
            ("quiet_hours.end_time", &self.quiet_hours.end_time),
        ] {
            NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
                SettingsError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{value}' is not a valid HH:MM time"),
                }
            })?;
        }
        Ok(())
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if the settings file exists but cannot be parsed,
    /// or if the default settings cannot be written to disk.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let settings: NotificationSettings =
                    toml::from_str(&content).map_err(|e| SettingsError::ParseFailed(e.to_string()))?;
                Ok(settings)
            }
            Err(_) => {
                let settings = Self::default();
                settings.save()?;
                Ok(settings)
            }
        }
    }

    /// Validate and persist to disk.
    ///
    /// # Errors
    /// Returns an error if validation fails or the file cannot be written.
    pub fn save(&self) -> Result<(), SettingsError> {
        self.validate()?;
        let path = Self::path()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| SettingsError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| SettingsError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by key, validate, and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the resulting settings are invalid, or saving fails. On error the
    /// in-memory settings are left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| SettingsError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let candidate: NotificationSettings =
            serde_json::from_value(json).map_err(|e| SettingsError::ParseFailed(e.to_string()))?;
        candidate.validate()?;
        *self = candidate;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = NotificationSettings::default();
        assert!(s.enabled);
        assert!(s.cycle_reminders.enabled);
        assert_eq!(
            s.license_reminders.interval_days,
            [1, 7, 14, 30, 60, 90].into_iter().collect()
        );
        assert_eq!(s.event_reminders.default_interval_days, 1);
        assert!(!s.quiet_hours.enabled);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn quiet_window_parses_and_wraps() {
        let q = QuietHoursConfig {
            enabled: true,
            start_time: "22:00".into(),
            end_time: "07:00".into(),
        };
        let (start, end) = q.window().unwrap();
        assert!(start > end);
    }

    #[test]
    fn disabled_quiet_window_is_none() {
        let q = QuietHoursConfig::default();
        assert!(q.window().is_none());
    }

    #[test]
    fn validate_rejects_malformed_quiet_time() {
        let mut s = NotificationSettings::default();
        s.quiet_hours.start_time = "25:99".into();
        let err = s.validate().unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }

    #[test]
    fn toml_round_trip_preserves_intervals() {
        let mut s = NotificationSettings::default();
        s.license_reminders.interval_days = [30, 7, 7, 1].into_iter().collect();
        let text = toml::to_string_pretty(&s).unwrap();
        let back: NotificationSettings = toml::from_str(&text).unwrap();
        // Duplicates collapse; order is the set's.
        assert_eq!(back.license_reminders.interval_days, [1, 7, 30].into_iter().collect());
    }

    #[test]
    fn get_by_dot_key() {
        let s = NotificationSettings::default();
        assert_eq!(s.get("enabled"), Some("true".to_string()));
        assert_eq!(s.get("quiet_hours.start_time"), Some("22:00".to_string()));
        assert_eq!(s.get("nope.nothing"), None);
    }

    #[test]
    fn set_rejects_unknown_key_without_mutating() {
        let mut s = NotificationSettings::default();
        let before = s.get("enabled");
        assert!(s.set("no_such_key", "true").is_err());
        assert_eq!(s.get("enabled"), before);
    }
}
