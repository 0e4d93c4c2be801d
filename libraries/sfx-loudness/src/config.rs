//! Normalization settings
//!
//! Every tolerance, target and limiter constant lives here and is passed
//! explicitly into each pipeline stage.

use crate::error::{NormalizeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "sfx-normalize.toml";

/// Environment variable prefix (`SFX_NORMALIZE_TARGET_LUFS`, ...)
pub const ENV_PREFIX: &str = "SFX_NORMALIZE";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizeConfig {
    /// Integrated loudness target in LUFS
    #[serde(default = "default_target_lufs")]
    pub target_lufs: f64,

    /// True peak target in dBTP for clips too short for integrated loudness
    #[serde(default = "default_target_peak_db")]
    pub target_peak_db: f64,

    /// Gap below which a file is left untouched (both regimes)
    #[serde(default = "default_tolerance_db")]
    pub tolerance_db: f64,

    /// Limiter ceiling in dBTP
    #[serde(default = "default_true_peak_ceiling_db")]
    pub true_peak_ceiling_db: f64,

    /// Loudness range target handed to the measurement pass
    #[serde(default = "default_loudness_range")]
    pub loudness_range: f64,

    #[serde(default = "default_limiter_attack_ms")]
    pub limiter_attack_ms: f64,

    #[serde(default = "default_limiter_release_ms")]
    pub limiter_release_ms: f64,

    /// Engine executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Directory processed when no paths are given
    #[serde(default = "default_audio_dir")]
    pub default_audio_dir: PathBuf,

    /// Appended to the original file name when keeping a backup
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

impl NormalizeConfig {
    /// Load configuration from the default file (if present) and environment
    pub fn load() -> Result<Self> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load_from(Some(&default_path))
        } else {
            Self::load_from(None)
        }
    }

    /// Load configuration from an explicit file and the environment
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(NormalizeError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("target_lufs", self.target_lufs),
            ("target_peak_db", self.target_peak_db),
            ("true_peak_ceiling_db", self.true_peak_ceiling_db),
            ("loudness_range", self.loudness_range),
        ] {
            if !value.is_finite() {
                return Err(NormalizeError::Config(format!("{name} must be finite")));
            }
        }

        if !(self.tolerance_db.is_finite() && self.tolerance_db > 0.0) {
            return Err(NormalizeError::Config(
                "tolerance_db must be a positive number".to_string(),
            ));
        }

        if self.true_peak_ceiling_db > 0.0 {
            return Err(NormalizeError::Config(format!(
                "true_peak_ceiling_db must not exceed 0 dBTP (got {})",
                self.true_peak_ceiling_db
            )));
        }

        // alimiter accepts attack 0.1-80 ms and release 1-8000 ms
        if !(0.1..=80.0).contains(&self.limiter_attack_ms) {
            return Err(NormalizeError::Config(format!(
                "limiter_attack_ms must be within 0.1..=80 (got {})",
                self.limiter_attack_ms
            )));
        }
        if !(1.0..=8000.0).contains(&self.limiter_release_ms) {
            return Err(NormalizeError::Config(format!(
                "limiter_release_ms must be within 1..=8000 (got {})",
                self.limiter_release_ms
            )));
        }

        if self.backup_suffix.is_empty() {
            return Err(NormalizeError::Config(
                "backup_suffix must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Limiter ceiling as a linear amplitude
    pub fn ceiling_linear(&self) -> f64 {
        10.0_f64.powf(self.true_peak_ceiling_db / 20.0)
    }
}

// Default values
fn default_target_lufs() -> f64 {
    -18.0
}

fn default_target_peak_db() -> f64 {
    -3.0
}

fn default_tolerance_db() -> f64 {
    1.5
}

fn default_true_peak_ceiling_db() -> f64 {
    -1.0
}

fn default_loudness_range() -> f64 {
    11.0
}

fn default_limiter_attack_ms() -> f64 {
    0.1
}

fn default_limiter_release_ms() -> f64 {
    50.0
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("assets").join("audio")
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_lufs: default_target_lufs(),
            target_peak_db: default_target_peak_db(),
            tolerance_db: default_tolerance_db(),
            true_peak_ceiling_db: default_true_peak_ceiling_db(),
            loudness_range: default_loudness_range(),
            limiter_attack_ms: default_limiter_attack_ms(),
            limiter_release_ms: default_limiter_release_ms(),
            ffmpeg_path: default_ffmpeg_path(),
            default_audio_dir: default_audio_dir(),
            backup_suffix: default_backup_suffix(),
        }
    }
}
