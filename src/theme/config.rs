//! Theme Configuration - fixed at construction

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::catalog::DEFAULT_SUBLIMINAL_MESSAGES;
use crate::error::{ThemeError, ThemeResult};

fn enabled() -> bool {
    true
}

fn default_static_intensity() -> f32 {
    0.12
}

fn default_corruption_frequency() -> u64 {
    2000
}

fn default_messages() -> Vec<String> {
    DEFAULT_SUBLIMINAL_MESSAGES.iter().map(|m| m.to_string()).collect()
}

/// Theme configuration. Recognized keys match the JavaScript option names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default = "enabled")]
    pub enable_audio: bool,
    #[serde(default = "enabled")]
    pub enable_static: bool,
    #[serde(default = "enabled")]
    pub enable_corruption: bool,
    #[serde(default = "enabled")]
    pub enable_subliminal: bool,
    #[serde(default = "enabled")]
    pub enable_escalation: bool,
    /// Opacity of the static canvas, 0 to 1
    #[serde(default = "default_static_intensity")]
    pub static_intensity: f32,
    /// Base interval of the element glitch, in ms
    #[serde(default = "default_corruption_frequency")]
    pub corruption_frequency: u64,
    #[serde(default = "default_messages")]
    pub subliminal_messages: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            enable_audio: true,
            enable_static: true,
            enable_corruption: true,
            enable_subliminal: true,
            enable_escalation: true,
            static_intensity: default_static_intensity(),
            corruption_frequency: default_corruption_frequency(),
            subliminal_messages: default_messages(),
        }
    }
}

impl ThemeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything off; enable features one by one
    pub fn quiet() -> Self {
        Self {
            enable_audio: false,
            enable_static: false,
            enable_corruption: false,
            enable_subliminal: false,
            enable_escalation: false,
            ..Self::default()
        }
    }

    pub fn with_audio(mut self, on: bool) -> Self { self.enable_audio = on; self }
    pub fn with_static(mut self, on: bool) -> Self { self.enable_static = on; self }
    pub fn with_corruption(mut self, on: bool) -> Self { self.enable_corruption = on; self }
    pub fn with_subliminal(mut self, on: bool) -> Self { self.enable_subliminal = on; self }
    pub fn with_escalation(mut self, on: bool) -> Self { self.enable_escalation = on; self }
    pub fn with_static_intensity(mut self, v: f32) -> Self { self.static_intensity = v; self }
    pub fn with_corruption_frequency(mut self, ms: u64) -> Self {
        self.corruption_frequency = ms;
        self
    }

    pub fn with_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subliminal_messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_json(json: &str) -> ThemeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ThemeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> ThemeResult<()> {
        if !(0.0..=1.0).contains(&self.static_intensity) {
            return Err(ThemeError::InvalidConfig(format!(
                "staticIntensity must be within 0..=1, got {}",
                self.static_intensity
            )));
        }
        if self.corruption_frequency == 0 {
            return Err(ThemeError::InvalidConfig("corruptionFrequency must be positive".into()));
        }
        if self.enable_subliminal && self.subliminal_messages.is_empty() {
            return Err(ThemeError::InvalidConfig(
                "subliminalMessages must not be empty while subliminal text is enabled".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_option_table() {
        let config = ThemeConfig::default();
        assert!(config.enable_audio && config.enable_static && config.enable_corruption);
        assert!(config.enable_subliminal && config.enable_escalation);
        assert_eq!(config.static_intensity, 0.12);
        assert_eq!(config.corruption_frequency, 2000);
        assert_eq!(config.subliminal_messages.len(), 18);
        assert_eq!(config.subliminal_messages[0], "YOU ARE BEING WATCHED");
    }

    #[test]
    fn empty_object_is_default() {
        let config = ThemeConfig::from_json("{}").unwrap();
        assert_eq!(config, ThemeConfig::default());
    }

    #[test]
    fn camel_case_keys_parse() {
        let config = ThemeConfig::from_json(
            r#"{"enableStatic": false, "staticIntensity": 0.4, "corruptionFrequency": 500,
                "subliminalMessages": ["A", "B"]}"#,
        )
        .unwrap();
        assert!(!config.enable_static);
        assert!(config.enable_audio);
        assert_eq!(config.static_intensity, 0.4);
        assert_eq!(config.corruption_frequency, 500);
        assert_eq!(config.subliminal_messages, vec!["A", "B"]);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(ThemeConfig::new().with_static_intensity(1.5).validate().is_err());
        assert!(ThemeConfig::new().with_corruption_frequency(0).validate().is_err());
        assert!(ThemeConfig::new().with_messages(Vec::<String>::new()).validate().is_err());
        assert!(ThemeConfig::quiet().with_messages(Vec::<String>::new()).validate().is_ok());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(ThemeConfig::from_json("{"), Err(ThemeError::Parse(_))));
    }
}
