//! Engine configuration.

use crate::color::ColorMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stratum_core::{Capabilities, MiceEvents};

/// How the engine sets up and drives the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mouse events to request at startup.
    pub mice: MiceEvents,
    /// Color mode (auto-detected if not specified).
    pub color_mode: Option<ColorMode>,
    /// Capabilities (auto-detected if not specified).
    pub capabilities: Option<Capabilities>,
    /// Draw on the alternate screen and restore the old one on exit.
    pub alternate_screen: bool,
    /// Hide the cursor while the engine runs.
    pub hide_cursor: bool,
    /// Ask the terminal to mark pasted text.
    pub bracketed_paste: bool,
    /// How long the input thread waits per poll, in milliseconds.
    pub input_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mice: MiceEvents::None,
            color_mode: None,
            capabilities: None,
            alternate_screen: true,
            hide_cursor: true,
            bracketed_paste: true,
            input_poll_ms: 50,
        }
    }
}

impl EngineConfig {
    /// Fast input polling with full mouse tracking.
    #[must_use]
    pub fn high_performance() -> Self {
        Self {
            mice: MiceEvents::All,
            input_poll_ms: 10,
            ..Default::default()
        }
    }

    /// Slow input polling, no mouse.
    #[must_use]
    pub fn power_saving() -> Self {
        Self {
            input_poll_ms: 200,
            ..Default::default()
        }
    }

    /// Render inline in the normal screen, keeping the cursor visible.
    #[must_use]
    pub fn inline() -> Self {
        Self {
            alternate_screen: false,
            hide_cursor: false,
            ..Default::default()
        }
    }

    /// Input poll interval; never zero.
    #[must_use]
    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.mice, MiceEvents::None);
        assert!(config.color_mode.is_none());
        assert!(config.capabilities.is_none());
        assert!(config.alternate_screen && config.hide_cursor);
        assert_eq!(config.input_poll(), Duration::from_millis(50));
    }

    #[test]
    fn test_config_presets() {
        let fast = EngineConfig::high_performance();
        assert_eq!(fast.input_poll_ms, 10);
        assert_eq!(fast.mice, MiceEvents::All);

        let slow = EngineConfig::power_saving();
        assert_eq!(slow.input_poll_ms, 200);
        assert_eq!(slow.mice, MiceEvents::None);

        let inline = EngineConfig::inline();
        assert!(!inline.alternate_screen && !inline.hide_cursor);
    }

    #[test]
    fn test_zero_poll_clamped() {
        let config = EngineConfig {
            input_poll_ms: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.input_poll(), Duration::from_millis(1));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"color_mode":"Color256","mice":"Buttons"}"#).unwrap();
        assert_eq!(config.color_mode, Some(ColorMode::Color256));
        assert_eq!(config.mice, MiceEvents::Buttons);
        assert!(config.alternate_screen);
        assert_eq!(config.input_poll_ms, 50);
    }

    #[test]
    fn test_capability_override_roundtrip() {
        let config = EngineConfig {
            capabilities: Some(Capabilities::UNICODE),
            ..EngineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
