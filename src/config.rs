//! Render settings.
//!
//! Settings come from built-in defaults, optionally overridden by a JSON
//! file and then by command-line flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default output sample rate (44.1 kHz).
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default directory score files are read from.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Default directory WAV files are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// Errors in loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sample rate must be positive")]
    InvalidSampleRate,
    #[error("speed coefficient must be a positive number, got {0}")]
    InvalidSpeed(f64),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,

    /// Playback speed coefficient. Start times and durations are divided by
    /// it: 2.0 plays twice as fast, 0.5 half as fast. Pitch is unchanged.
    pub speed: f64,

    /// Directory score files are resolved against.
    pub assets_dir: PathBuf,

    /// Directory output files are written to.
    pub output_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            speed: 1.0,
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl RenderConfig {
    /// Loads settings from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Checks that the settings can produce a track.
    ///
    /// # Errors
    ///
    /// Returns error for a zero sample rate or a non-positive or non-finite speed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        Ok(())
    }

    /// Path of the score file named `name`.
    pub fn score_path(&self, name: &str) -> PathBuf {
        self.assets_dir.join(format!("{}.json", name))
    }

    /// Path of the WAV file named `name`.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.wav", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.speed, 1.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.score_path("demo"), PathBuf::from("assets/demo.json"));
        assert_eq!(config.output_path("baba"), PathBuf::from("out/baba.wav"));
    }

    #[test]
    fn test_validate() {
        let mut config = RenderConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleRate)
        ));

        config.sample_rate = 8000;
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            config.speed = speed;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidSpeed(_))
            ));
        }

        config.speed = 1.9;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"speed": 1.9}"#).unwrap();
        assert_eq!(config.speed, 1.9);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("scoremix_config_test.json");
        fs::write(&path, r#"{"sample_rate": 8000, "output_dir": "renders"}"#).unwrap();

        let config = RenderConfig::load_from_file(&path).unwrap();
        assert_eq!(config.sample_rate, 8000);
        assert_eq!(config.output_dir, PathBuf::from("renders"));
        assert_eq!(config.speed, 1.0);

        fs::remove_file(&path).unwrap();
    }
}
