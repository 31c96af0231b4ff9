//! Editor settings.
//!
//! Typed replacement for the editor's persisted key/value settings blob. The
//! store receives an [`EditorSettings`] value at construction and reads
//! defaults and toggles from it; nothing is looked up globally.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DeviceModel, Effect, MAX_BRIGHTNESS};
use crate::placement::MIN_DURATION_MS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Default brightness must be between 0 and 4095, got {0}")]
    Brightness(u16),

    #[error("Default duration must be at least 20 ms, got {0} ms")]
    Duration(f64),

    #[error("History limit must be at least 1")]
    HistoryLimit,

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings that shape editing behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    /// Device profile; determines the number of zones.
    pub device: DeviceModel,
    /// Duration of blocks created at the cursor.
    pub default_duration_ms: f64,
    /// Brightness of blocks created at the cursor (and of pastes when
    /// `modify_paste_brightness` is on).
    pub default_brightness: u16,
    pub default_effect: Effect,
    /// Selecting a block keeps other selections instead of replacing them.
    pub multi_select: bool,
    /// Overwrite pasted blocks' brightness with `default_brightness`.
    pub modify_paste_brightness: bool,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Seed for randomized effects; OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            device: DeviceModel::Np1,
            default_duration_ms: 500.0,
            default_brightness: MAX_BRIGHTNESS,
            default_effect: Effect::Constant,
            multi_select: false,
            modify_paste_brightness: false,
            history_limit: 100,
            seed: None,
        }
    }
}

impl EditorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_brightness > MAX_BRIGHTNESS {
            return Err(ConfigError::Brightness(self.default_brightness));
        }
        if self.default_duration_ms.is_nan() || self.default_duration_ms < MIN_DURATION_MS {
            return Err(ConfigError::Duration(self.default_duration_ms));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::HistoryLimit);
        }
        Ok(())
    }

    /// Parse and validate a persisted settings blob. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = EditorSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.device.zone_count(), 5);
    }

    #[test]
    fn test_partial_blob_takes_defaults() {
        let settings =
            EditorSettings::from_json(r#"{ "device": "NP2a", "multiSelect": true }"#).unwrap();
        assert_eq!(settings.device, DeviceModel::Np2a);
        assert!(settings.multi_select);
        assert_eq!(settings.default_duration_ms, 500.0);
        assert_eq!(settings.default_effect, Effect::Constant);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            EditorSettings::from_json(r#"{ "defaultBrightness": 5000 }"#),
            Err(ConfigError::Brightness(5000))
        ));
        assert!(matches!(
            EditorSettings::from_json(r#"{ "defaultDurationMs": 5 }"#),
            Err(ConfigError::Duration(_))
        ));
        assert!(matches!(
            EditorSettings::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let settings = EditorSettings {
            default_effect: Effect::Strobe,
            seed: Some(9),
            ..Default::default()
        };
        let parsed = EditorSettings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }
}
