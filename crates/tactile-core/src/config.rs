//! Configuration for agents and the gesture recognizer.
//!
//! Loaded from TOML (`tactile.toml` by default):
//!
//! ```toml
//! [gesture]
//! tap_interval_ms = 300
//! tap_slop = 10.0
//!
//! [pointer]
//! picking = "click"
//! sensitivities = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
//! ```

use crate::error::{ConfigError, Result};
use crate::gesture::GestureConfig;
use crate::motion::MAX_AXES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When the pointer agent polls grabbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickingMode {
    /// Poll on every move; the grabber under the pointer follows it.
    #[default]
    Move,
    /// Poll only on clicks.
    Click,
}

/// Per-agent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Per-axis multipliers applied to absolute motion events.
    pub sensitivities: [f32; MAX_AXES],
    /// Polling policy (pointer agent only).
    pub picking: PickingMode,
    /// Whether `poll` may change the tracked grabber.
    pub tracking: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            sensitivities: [1.0; MAX_AXES],
            picking: PickingMode::Move,
            tracking: true,
        }
    }
}

impl AgentConfig {
    fn validate(&self, section: &str) -> Result<()> {
        for (i, s) in self.sensitivities.iter().enumerate() {
            if !s.is_finite() {
                return Err(ConfigError::invalid(
                    format!("{section}.sensitivities[{i}]"),
                    "must be finite",
                ));
            }
        }
        Ok(())
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TactileConfig {
    /// Gesture recognizer thresholds.
    pub gesture: GestureConfig,
    /// Pointer agent.
    pub pointer: AgentConfig,
    /// Keyboard agent.
    pub keyboard: AgentConfig,
    /// Touch agent.
    pub touch: AgentConfig,
}

impl TactileConfig {
    /// Default config file name.
    pub const CONFIG_FILE: &'static str = "tactile.toml";

    /// Parse and validate a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Load from a file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Load from `tactile.toml` in the current directory, or defaults.
    #[must_use]
    pub fn load_default() -> Self {
        Self::load_from_file(Path::new(Self::CONFIG_FILE)).unwrap_or_default()
    }

    /// Reject thresholds the recognizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture;
        if g.tap_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "gesture.tap_interval_ms",
                "must be greater than zero",
            ));
        }
        let thresholds = [
            ("gesture.double_tap_distance", g.double_tap_distance),
            ("gesture.tap_slop", g.tap_slop),
            ("gesture.flick_velocity", g.flick_velocity),
            ("gesture.turn_angle", g.turn_angle),
            ("gesture.pinch_distance", g.pinch_distance),
            ("gesture.max_multi_drag_distance", g.max_multi_drag_distance),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, "must be a finite non-negative number"));
            }
        }
        self.pointer.validate("pointer")?;
        self.keyboard.validate("keyboard")?;
        self.touch.validate("touch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TactileConfig::default();
        assert_eq!(config.pointer.picking, PickingMode::Move);
        assert!(config.pointer.tracking);
        assert_eq!(config.touch.sensitivities, [1.0; MAX_AXES]);
        assert_eq!(config.gesture.tap_interval_ms, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TactileConfig::from_toml(
            r#"
[gesture]
tap_slop = 4.0

[pointer]
picking = "click"
tracking = false
"#,
        )
        .unwrap();
        assert_eq!(config.gesture.tap_slop, 4.0);
        assert_eq!(config.gesture.tap_interval_ms, 300);
        assert_eq!(config.pointer.picking, PickingMode::Click);
        assert!(!config.pointer.tracking);
        assert!(config.keyboard.tracking);
    }

    #[test]
    fn test_to_toml_roundtrips_sections() {
        let toml_str = TactileConfig::default().to_toml();
        assert!(toml_str.contains("[gesture]"));
        assert!(toml_str.contains("[pointer]"));
        assert!(toml_str.contains("tap_interval_ms"));
        let parsed = TactileConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, TactileConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let err = TactileConfig::from_toml("gesture = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_tap_interval_rejected() {
        let err = TactileConfig::from_toml("[gesture]\ntap_interval_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "gesture.tap_interval_ms"
        ));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let mut config = TactileConfig::default();
        config.gesture.pinch_distance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_sensitivity_rejected() {
        let mut config = TactileConfig::default();
        config.touch.sensitivities[2] = f32::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("touch.sensitivities[2]"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err =
            TactileConfig::load_from_file(Path::new("/nonexistent/tactile.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
