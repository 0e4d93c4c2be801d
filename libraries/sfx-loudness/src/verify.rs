//! Post-apply re-measurement, for reporting only

use crate::config::NormalizeConfig;
use crate::engine::LoudnessEngine;
use crate::error::{NormalizeError, Result};
use crate::format::AudioFile;
use crate::measure::{LoudnessMeasurement, Measurer};

pub struct Verifier<'a> {
    measurer: Measurer<'a>,
}

impl<'a> Verifier<'a> {
    pub fn new(engine: &'a dyn LoudnessEngine, config: &'a NormalizeConfig) -> Self {
        Self {
            measurer: Measurer::new(engine, config),
        }
    }

    /// Re-measure a freshly normalized file
    ///
    /// Failure never changes the file's outcome; callers report it as unverified.
    pub async fn verify(&self, file: &AudioFile, target_lufs: f64) -> Result<LoudnessMeasurement> {
        self.measurer
            .measure(file, target_lufs)
            .await
            .map_err(|e| NormalizeError::Verify {
                path: file.path().to_path_buf(),
                reason: match e {
                    NormalizeError::Measurement { reason, .. } => reason,
                    other => other.to_string(),
                },
            })
    }
}
