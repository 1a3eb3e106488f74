//! TOML-based application configuration.
//!
//! Holds the engine cadences and tolerances plus display and notification
//! preferences. Timer settings (rate, start time, duration) are not here:
//! they belong to a namespace and live in the key-value store.
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Engine cadences and drift tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_auto_start_poll_ms")]
    pub auto_start_poll_ms: u64,
    #[serde(default = "default_drift_check_interval_ms")]
    pub drift_check_interval_ms: u64,
    /// Resync threshold for the periodic drift check.
    #[serde(default = "default_drift_tolerance_secs")]
    pub drift_tolerance_secs: f64,
    /// Resync threshold after a wake signal.
    #[serde(default = "default_wake_tolerance_secs")]
    pub wake_tolerance_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_auto_start_poll_ms() -> u64 {
    1000
}
fn default_drift_check_interval_ms() -> u64 {
    10_000
}
fn default_drift_tolerance_secs() -> f64 {
    0.5
}
fn default_wake_tolerance_secs() -> f64 {
    1.0
}
fn default_currency_symbol() -> String {
    "$".into()
}
fn default_decimals() -> u32 {
    2
}
fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_start_poll_ms: default_auto_start_poll_ms(),
            drift_check_interval_ms: default_drift_check_interval_ms(),
            drift_tolerance_secs: default_drift_tolerance_secs(),
            wake_tolerance_secs: default_wake_tolerance_secs(),
        }
    }
}

/// Longest accepted cadence: one hour.
pub const MAX_INTERVAL_MS: u64 = 3_600_000;

fn clamp_interval(ms: u64) -> chrono::Duration {
    chrono::Duration::milliseconds(ms.clamp(1, MAX_INTERVAL_MS) as i64)
}

impl EngineConfig {
    pub fn tick_interval(&self) -> chrono::Duration {
        clamp_interval(self.tick_interval_ms)
    }

    pub fn auto_start_poll(&self) -> chrono::Duration {
        clamp_interval(self.auto_start_poll_ms)
    }

    pub fn drift_check_interval(&self) -> chrono::Duration {
        clamp_interval(self.drift_check_interval_ms)
    }

    /// Pull cadences into `1..=MAX_INTERVAL_MS`.
    pub fn normalized(mut self) -> Self {
        for ms in [
            &mut self.tick_interval_ms,
            &mut self.auto_start_poll_ms,
            &mut self.drift_check_interval_ms,
        ] {
            *ms = (*ms).clamp(1, MAX_INTERVAL_MS);
        }
        self
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            decimals: default_decimals(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
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
        key.split('.').try_fold(root, |node, part| node.get(part))
    }

    /// Replace a leaf value, keeping the JSON type of the existing value.
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

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(n) if n.is_u64() => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|e| invalid(e.to_string()))?
                    .into(),
            ),
            serde_json::Value::Number(_) => {
                let n = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
                serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
            }
            serde_json::Value::Object(_) => return Err(invalid("not a leaf key".into())),
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut cfg: Self =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.engine = cfg.engine.normalized();
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

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |e: serde_json::Error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        };
        let mut json = serde_json::to_value(&*self).map_err(invalid)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(invalid)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[engine]\ntick_interval_ms = 250\n").unwrap();
        assert_eq!(parsed.engine.tick_interval_ms, 250);
        assert_eq!(parsed.engine.drift_check_interval_ms, 10_000);
        assert_eq!(parsed.display.currency_symbol, "$");
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("engine.tick_interval_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("engine.drift_tolerance_secs").as_deref(), Some("0.5"));
        assert_eq!(cfg.get("display.currency_symbol").as_deref(), Some("$"));
        assert!(cfg.get("engine.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_keeps_value_types() {
        let mut cfg = Config::default();
        cfg.set("engine.tick_interval_ms", "500").unwrap();
        cfg.set("engine.wake_tolerance_secs", "2.5").unwrap();
        cfg.set("display.currency_symbol", "€").unwrap();
        cfg.set("notifications.enabled", "false").unwrap();
        assert_eq!(cfg.engine.tick_interval_ms, 500);
        assert_eq!(cfg.engine.wake_tolerance_secs, 2.5);
        assert_eq!(cfg.display.currency_symbol, "€");
        assert!(!cfg.notifications.enabled);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("engine.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("notifications.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("engine", "1").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn oversized_intervals_are_clamped() {
        let mut cfg = Config::default();
        cfg.set("engine.tick_interval_ms", "100000000000000000").unwrap();
        cfg.set("engine.drift_check_interval_ms", "0").unwrap();
        assert_eq!(cfg.engine.tick_interval(), chrono::Duration::hours(1));
        assert_eq!(cfg.engine.drift_check_interval(), chrono::Duration::milliseconds(1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.tick_interval_ms, MAX_INTERVAL_MS);
        assert_eq!(loaded.engine.drift_check_interval_ms, 1);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("display.decimals", "3").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().display.decimals, 3);
    }
}
