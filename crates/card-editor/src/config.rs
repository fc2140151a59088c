//! Editor configuration.

use card_core::MIN_DIMENSION;
use serde::{Deserialize, Serialize};

/// Tunables for an editing session. Every field has a default, so a partial
/// JSON object (or `{}`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo depth; the oldest snapshot is dropped first.
    pub history_depth: usize,
    /// Floor for width/height after a transform.
    pub min_dimension: f32,
    pub nudge_step: f32,
    /// Nudge distance with Shift held.
    pub nudge_step_large: f32,
    /// Offset applied to duplicates and pastes.
    pub duplicate_offset: f32,
    pub default_icon_prefix: String,
    /// Initial session-wide layout flag. Transforms and text edits are
    /// rejected while layout is disabled.
    pub layout_enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 200,
            min_dimension: MIN_DIMENSION,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            duplicate_offset: 20.0,
            default_icon_prefix: "mdi".into(),
            layout_enabled: true,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        config.history_depth = config.history_depth.max(1);
        config.min_dimension = if config.min_dimension.is_finite() && config.min_dimension > 0.0 {
            config.min_dimension
        } else {
            MIN_DIMENSION
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"historyDepth": 5, "nudgeStepLarge": 25}"#).unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.nudge_step_large, 25.0);
        assert_eq!(config.nudge_step, 1.0);
        assert_eq!(config.default_icon_prefix, "mdi");
    }

    #[test]
    fn degenerate_values_are_repaired() {
        let config = EditorConfig::from_json(r#"{"historyDepth": 0, "minDimension": -1}"#).unwrap();
        assert_eq!(config.history_depth, 1);
        assert_eq!(config.min_dimension, MIN_DIMENSION);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EditorConfig::from_json("{").is_err());
    }
}
