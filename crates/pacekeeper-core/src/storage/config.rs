//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Target speed, alert cooldown and how out-of-range targets are handled
//! - Alert feedback toggles (audio, vibration)
//! - Sample source selection and its parameters
//!
//! Configuration is stored at `~/.config/pacekeeper/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::pace::{
    PaceAlertEngine, TargetPolicy, TargetSpeed, DEFAULT_COOLDOWN_MS, DEFAULT_TARGET_KMH,
};
use crate::source::SourceKind;

/// Pace-alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceConfig {
    #[serde(default = "default_target_speed")]
    pub target_speed_kmh: f64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub target_policy: TargetPolicy,
    /// Forget the last alert time when tracking restarts.
    #[serde(default)]
    pub reset_cooldown_on_start: bool,
}

/// Alert feedback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub audio: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
}

/// Sample source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// JSON-lines file read by the replay source.
    #[serde(default)]
    pub replay_path: Option<PathBuf>,
    /// Gap between fixes reported as a position timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Seed of the simulated run.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Spacing between simulated fixes.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pacekeeper/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pace: PaceConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

// Default functions
fn default_target_speed() -> f64 {
    DEFAULT_TARGET_KMH
}
fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN_MS
}
fn default_true() -> bool {
    true
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_seed() -> u64 {
    42
}
fn default_interval_ms() -> u64 {
    1_000
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            target_speed_kmh: default_target_speed(),
            cooldown_ms: default_cooldown_ms(),
            target_policy: TargetPolicy::default(),
            reset_cooldown_on_start: false,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            audio: true,
            vibration: true,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            replay_path: None,
            timeout_ms: default_timeout_ms(),
            seed: default_seed(),
            interval_ms: default_interval_ms(),
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
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

    /// Location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// holds invalid values, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
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

    /// Persist to disk.
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
    /// See [`Config::save`].
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check values that serde alone cannot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target()?;
        if self.source.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "source.interval_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// The configured target after applying the target policy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if the target is rejected.
    pub fn target(&self) -> Result<TargetSpeed, ConfigError> {
        TargetSpeed::with_policy(self.pace.target_speed_kmh, self.pace.target_policy).map_err(|e| {
            ConfigError::InvalidValue {
                key: "pace.target_speed_kmh".into(),
                message: e.to_string(),
            }
        })
    }

    /// Build an idle engine from the pace settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if the configured target is rejected.
    pub fn engine(&self) -> Result<PaceAlertEngine, ConfigError> {
        Ok(PaceAlertEngine::new(self.target()?)
            .with_cooldown_ms(self.pace.cooldown_ms)
            .with_policy(self.pace.target_policy)
            .with_reset_cooldown_on_start(self.pace.reset_cooldown_on_start))
    }
}
