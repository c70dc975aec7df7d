use std::{fs, path::Path, time::Duration};

use clap::ValueEnum;
use serde::Deserialize;
use speech_panel::{native::NativeBackend, PanelConfig};

use crate::NarratorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BackendName {
    #[default]
    Platform,
    SpeechDispatcher,
}

impl From<BackendName> for NativeBackend {
    fn from(name: BackendName) -> Self {
        match name {
            BackendName::Platform => NativeBackend::Platform,
            BackendName::SpeechDispatcher => NativeBackend::SpeechDispatcher,
        }
    }
}

/// Start-up settings read from `narrator.toml`. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    pub backend: BackendName,
    pub voice_load_grace_ms: u64,
    pub log_level: String,
    /// Wait at exit for the last utterance: at least `drain_min_ms`, plus this much per character.
    pub drain_ms_per_char: u64,
    pub drain_min_ms: u64,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            backend: BackendName::Platform,
            voice_load_grace_ms: 2000,
            log_level: "info".to_string(),
            drain_ms_per_char: 200,
            drain_min_ms: 5000,
        }
    }
}

impl NarratorConfig {
    /// Read the config file, or use the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, NarratorError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, NarratorError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            voice_load_grace: Duration::from_millis(self.voice_load_grace_ms),
        }
    }

    /// Longest time to wait for `text` to finish speaking before exiting anyway.
    pub fn drain_timeout(&self, text: &str) -> Duration {
        let per_char = self
            .drain_ms_per_char
            .saturating_mul(text.chars().count() as u64);
        Duration::from_millis(per_char.max(self.drain_min_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(NarratorConfig::parse("").unwrap(), NarratorConfig::default());
    }

    #[test]
    fn reads_all_keys() {
        let config = NarratorConfig::parse(
            r#"
            backend = "speech-dispatcher"
            voice_load_grace_ms = 500
            log_level = "debug"
            drain_ms_per_char = 80
            drain_min_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendName::SpeechDispatcher);
        assert_eq!(config.drain_ms_per_char, 80);
        assert_eq!(config.drain_min_ms, 1000);
        assert_eq!(
            config.panel_config().voice_load_grace,
            Duration::from_millis(500)
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn drain_timeout_scales_with_text() {
        let config = NarratorConfig::default();
        assert_eq!(config.drain_timeout("hi"), Duration::from_millis(5000));
        assert_eq!(
            config.drain_timeout(&"a".repeat(100)),
            Duration::from_millis(20_000)
        );

        let config = NarratorConfig::parse("drain_ms_per_char = 0\ndrain_min_ms = 0").unwrap();
        assert_eq!(config.drain_timeout("anything"), Duration::ZERO);
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(matches!(
            NarratorConfig::parse(r#"backend = "festival""#),
            Err(NarratorError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = NarratorConfig::load(Path::new("/nonexistent/narrator.toml")).unwrap();
        assert_eq!(config, NarratorConfig::default());
    }
}
