//! Configuration types for the lip-sync pipeline.

use crate::viseme::VisemeCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeleneConfig {
    /// Grapheme-to-phoneme backend selection.
    pub phonemizer: PhonemizerConfig,
    /// Duration estimation and track assembly.
    pub timing: TimingConfig,
    /// Timing-based fallback settings.
    pub fallback: FallbackConfig,
    /// Per-symbol overrides of the built-in phoneme → viseme table.
    ///
    /// Keys are ARPABET symbols (stress digits ignored), values are category
    /// names such as `"open_wide"`.
    pub visemes: BTreeMap<String, VisemeCategory>,
}

/// Which G2P backend to load at startup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhonemizerBackendKind {
    /// misaki-rs G2P (requires the `misaki` feature).
    #[default]
    Misaki,
    /// CMU-format pronunciation lexicon read from `lexicon_path`.
    Lexicon,
    /// No phonemizer; always use the timing-based fallback.
    Disabled,
}

/// Phonemizer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhonemizerConfig {
    pub backend: PhonemizerBackendKind,
    /// British English pronunciation for misaki (American when `false`).
    pub british: bool,
    /// Lexicon file for the `lexicon` backend.
    pub lexicon_path: Option<PathBuf>,
}

/// Duration estimation and assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Speaking rate used to guess clip length before synthesis.
    pub words_per_minute: f32,
    /// Merge adjacent events that show the same mouth shape.
    pub merge_repeats: bool,
    /// Per-symbol overrides of the built-in duration weights.
    pub weights: BTreeMap<String, u32>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150.0,
            merge_repeats: true,
            weights: BTreeMap::new(),
        }
    }
}

/// Fallback timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Relative length of an open-mouth beat.
    pub open_weight: u32,
    /// Relative length of a closed-mouth beat.
    pub closed_weight: u32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            open_weight: 2,
            closed_weight: 1,
        }
    }
}

impl SeleneConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::LipSyncError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LipSyncError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/selene/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("selene").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("selene")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/selene-config/config.toml")
        }
    }

    /// Check values that serde cannot.
    ///
    /// Returns every problem found rather than stopping at the first.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.timing.words_per_minute.is_finite() && self.timing.words_per_minute > 0.0) {
            errors.push(format!(
                "timing.words_per_minute must be positive, got {}",
                self.timing.words_per_minute
            ));
        }
        for (symbol, weight) in &self.timing.weights {
            if *weight == 0 {
                errors.push(format!("timing.weights.{symbol} must be at least 1"));
            }
        }
        if self.fallback.open_weight == 0 {
            errors.push("fallback.open_weight must be at least 1".to_owned());
        }
        if self.fallback.closed_weight == 0 {
            errors.push("fallback.closed_weight must be at least 1".to_owned());
        }
        if self.phonemizer.backend == PhonemizerBackendKind::Lexicon
            && self.phonemizer.lexicon_path.is_none()
        {
            errors.push("phonemizer.lexicon_path is required for the lexicon backend".to_owned());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SeleneConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.timing.words_per_minute > 0.0);
        assert!(config.timing.merge_repeats);
        assert_eq!(config.phonemizer.backend, PhonemizerBackendKind::Misaki);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SeleneConfig::default();
        config.phonemizer.backend = PhonemizerBackendKind::Lexicon;
        config.phonemizer.lexicon_path = Some(PathBuf::from("/opt/cmudict.dict"));
        config.timing.words_per_minute = 180.0;
        config.timing.weights.insert("AA".to_owned(), 5);
        config
            .visemes
            .insert("R".to_owned(), VisemeCategory::Open);

        config.save_to_file(&path).unwrap();
        let loaded = SeleneConfig::from_file(&path).unwrap();

        assert_eq!(loaded.phonemizer.backend, PhonemizerBackendKind::Lexicon);
        assert_eq!(
            loaded.phonemizer.lexicon_path.as_deref(),
            Some(std::path::Path::new("/opt/cmudict.dict"))
        );
        assert!((loaded.timing.words_per_minute - 180.0).abs() < f32::EPSILON);
        assert_eq!(loaded.timing.weights.get("AA"), Some(&5));
        assert_eq!(loaded.visemes.get("R"), Some(&VisemeCategory::Open));
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result =
            SeleneConfig::from_file(std::path::Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(SeleneConfig::from_file(&path).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: SeleneConfig = toml::from_str(
            r#"
            [phonemizer]
            backend = "disabled"

            [visemes]
            AA = "mid"
            "#,
        )
        .unwrap();
        assert_eq!(config.phonemizer.backend, PhonemizerBackendKind::Disabled);
        assert_eq!(config.visemes.get("AA"), Some(&VisemeCategory::Mid));
        assert_eq!(config.fallback.open_weight, 2);
        assert!(config.timing.merge_repeats);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let result: std::result::Result<SeleneConfig, _> = toml::from_str(
            r#"
            [visemes]
            AA = "yawn"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn validate_collects_all_problems() {
        let mut config = SeleneConfig::default();
        config.timing.words_per_minute = 0.0;
        config.fallback.open_weight = 0;
        config.timing.weights.insert("P".to_owned(), 0);
        config.phonemizer.backend = PhonemizerBackendKind::Lexicon;
        assert_eq!(config.validate().len(), 4);
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = SeleneConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("selene"));
    }
}
