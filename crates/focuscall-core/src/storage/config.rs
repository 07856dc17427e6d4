//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default round count and stage durations for the settings form
//! - Ambient and music channel switches and volumes
//! - Where the call clips and background tracks live
//!
//! Configuration is stored at `~/.config/focuscall/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::media::{BackgroundSettings, Channel};
use crate::timer::SessionConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Values pre-filled in the settings form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
    #[serde(default = "default_focus_seconds")]
    pub focus_seconds: u32,
    #[serde(default = "default_break_seconds")]
    pub break_seconds: u32,
}

/// Background channel preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub ambient_enabled: bool,
    #[serde(default = "default_ambient_volume")]
    pub ambient_volume: u32,
    #[serde(default = "default_true")]
    pub music_enabled: bool,
    #[serde(default = "default_music_volume")]
    pub music_volume: u32,
}

/// Asset locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory probed for call clips (answering, hangup, intros, end, backdrop).
    #[serde(default)]
    pub call_dir: Option<String>,
    /// Ambient soundscape loop.
    #[serde(default)]
    pub ambient: Option<String>,
    /// Background music track.
    #[serde(default)]
    pub music: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focuscall/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionDefaults,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

// Default functions
fn default_total_rounds() -> u32 {
    4
}
fn default_focus_seconds() -> u32 {
    25 * 60
}
fn default_break_seconds() -> u32 {
    5 * 60
}
fn default_true() -> bool {
    true
}
fn default_ambient_volume() -> u32 {
    50
}
fn default_music_volume() -> u32 {
    60
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            total_rounds: default_total_rounds(),
            focus_seconds: default_focus_seconds(),
            break_seconds: default_break_seconds(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ambient_enabled: true,
            ambient_volume: default_ambient_volume(),
            music_enabled: true,
            music_volume: default_music_volume(),
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
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    // Unset optional paths accept any string; "" clears them.
                    serde_json::Value::Null | serde_json::Value::String(_) => {
                        if value.is_empty() {
                            serde_json::Value::Null
                        } else {
                            serde_json::Value::String(value.into())
                        }
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::flatten(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            serde_json::Value::Null => out.push((prefix.to_string(), String::new())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    /// Path of the config file in the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Like [`Config::load`], against an explicit file.
    ///
    /// # Errors
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
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

    /// # Errors
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    ///
    /// Unset optional values read as an empty string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// for that key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Every leaf as `(dot.path, value)`, sorted by key.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::flatten("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Session shape from the configured defaults.
    ///
    /// # Errors
    /// Returns [`ValidationError::MustBePositive`] if any value is zero.
    pub fn session_config(&self) -> Result<SessionConfig, ValidationError> {
        SessionConfig::new(
            self.session.total_rounds,
            self.session.focus_seconds,
            self.session.break_seconds,
        )
    }

    /// Background channel settings.
    ///
    /// # Errors
    /// Returns [`ValidationError::VolumeOutOfRange`] if a volume exceeds 100.
    pub fn background_settings(&self) -> Result<BackgroundSettings, ValidationError> {
        let volume = |channel: Channel, value: u32| {
            u8::try_from(value).map_err(|_| ValidationError::VolumeOutOfRange {
                channel: channel.to_string(),
                value,
            })
        };
        let settings = BackgroundSettings {
            ambient_enabled: self.audio.ambient_enabled,
            ambient_volume: volume(Channel::Ambient, self.audio.ambient_volume)?,
            music_enabled: self.audio.music_enabled,
            music_volume: volume(Channel::Music, self.audio.music_volume)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Clip directory; `<data_dir>/call` when not configured.
    pub fn call_dir(&self) -> Option<PathBuf> {
        match &self.assets.call_dir {
            Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
            _ => data_dir().ok().map(|d| d.join("call")),
        }
    }
}
