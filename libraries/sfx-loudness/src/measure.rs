//! Loudness measurement
//!
//! Runs the engine's measurement pass and pulls the statistics block out of
//! its diagnostic output. ffmpeg's loudnorm prints something like:
//!
//! ```text
//! [Parsed_loudnorm_0 @ 0x5581]
//! {
//!     "input_i" : "-27.61",
//!     "input_tp" : "-4.47",
//!     "input_lra" : "18.06",
//!     "input_thresh" : "-39.20",
//!     ...
//!     "target_offset" : "0.58"
//! }
//! ```
//!
//! Values arrive as strings and may be `-inf` for clips that are too short
//! or too quiet for gated loudness.

use crate::config::NormalizeConfig;
use crate::engine::{LoudnessEngine, MeasureRequest};
use crate::error::{NormalizeError, Result};
use crate::format::AudioFile;
use serde::{Deserialize, Deserializer, Serialize};

/// Loudness statistics for one file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessMeasurement {
    /// Integrated loudness (LUFS); non-finite when too short to measure
    #[serde(rename(deserialize = "input_i"), deserialize_with = "lenient_f64")]
    pub integrated_lufs: f64,
    /// True peak (dBTP)
    #[serde(rename(deserialize = "input_tp"), deserialize_with = "lenient_f64")]
    pub true_peak_db: f64,
    /// Loudness range (LU)
    #[serde(rename(deserialize = "input_lra"), deserialize_with = "lenient_f64")]
    pub loudness_range: f64,
    /// Gating threshold (LUFS)
    #[serde(rename(deserialize = "input_thresh"), deserialize_with = "lenient_f64")]
    pub threshold: f64,
    /// Offset the engine would apply to reach the requested target
    #[serde(deserialize_with = "lenient_f64")]
    pub target_offset: f64,
}

impl LoudnessMeasurement {
    /// Measurement with only integrated loudness and peak set; the rest is zero
    pub fn new(integrated_lufs: f64, true_peak_db: f64) -> Self {
        Self {
            integrated_lufs,
            true_peak_db,
            loudness_range: 0.0,
            threshold: 0.0,
            target_offset: 0.0,
        }
    }
}

/// Accept both `"-27.61"` and `-27.61`, including `inf`/`-inf`/`nan` spellings
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {text:?}"))),
    }
}

/// Locate the trailing brace-delimited block in free-form text
///
/// Scans from the end: the last `}` and the last `{` that precedes it.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let end = text.rfind('}')?;
    let start = text[..end].rfind('{')?;
    Some(&text[start..=end])
}

/// Parse a measurement out of the engine's diagnostic output
pub fn parse_measurement(diagnostics: &str) -> std::result::Result<LoudnessMeasurement, String> {
    let block = extract_json_block(diagnostics)
        .ok_or_else(|| "no measurement block in engine output".to_string())?;
    serde_json::from_str(block).map_err(|e| format!("invalid measurement block: {e}"))
}

/// Wraps the engine's measurement pass
pub struct Measurer<'a> {
    engine: &'a dyn LoudnessEngine,
    config: &'a NormalizeConfig,
}

impl<'a> Measurer<'a> {
    pub fn new(engine: &'a dyn LoudnessEngine, config: &'a NormalizeConfig) -> Self {
        Self { engine, config }
    }

    /// Measure `file` against `target_lufs`
    ///
    /// A single engine invocation; a non-zero exit or an unparseable block
    /// is a [`NormalizeError::Measurement`].
    pub async fn measure(&self, file: &AudioFile, target_lufs: f64) -> Result<LoudnessMeasurement> {
        let request = MeasureRequest {
            target_lufs,
            true_peak_db: self.config.true_peak_ceiling_db,
            loudness_range: self.config.loudness_range,
        };

        let failure = |reason: String| NormalizeError::Measurement {
            path: file.path().to_path_buf(),
            reason,
        };

        let output = self
            .engine
            .measure(file.path(), &request)
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !output.success {
            return Err(failure(format!(
                "engine exited with an error: {}",
                output.last_line()
            )));
        }

        let measurement = parse_measurement(&output.diagnostics).map_err(failure)?;
        tracing::debug!(
            "Measured {}: I={} TP={} LRA={} thresh={} offset={}",
            file.path().display(),
            measurement.integrated_lufs,
            measurement.true_peak_db,
            measurement.loudness_range,
            measurement.threshold,
            measurement.target_offset
        );

        Ok(measurement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOUDNORM_OUTPUT: &str = r#"Input #0, wav, from 'jump.wav':
  Duration: 00:00:01.20, bitrate: 1411 kb/s
  Stream #0:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 44100 Hz, 2 channels, s16, 1411 kb/s
Stream mapping:
  Stream #0:0 -> #0:0 (pcm_s16le (native) -> pcm_s16le (native))
[Parsed_loudnorm_0 @ 0x55d1c0a3f2c0]
{
	"input_i" : "-27.61",
	"input_tp" : "-4.47",
	"input_lra" : "18.06",
	"input_thresh" : "-39.20",
	"output_i" : "-16.58",
	"output_tp" : "-1.50",
	"output_lra" : "14.78",
	"output_thresh" : "-27.71",
	"normalization_type" : "dynamic",
	"target_offset" : "0.58"
}
"#;

    #[test]
    fn test_parse_loudnorm_output() {
        let m = parse_measurement(LOUDNORM_OUTPUT).unwrap();
        assert_eq!(m.integrated_lufs, -27.61);
        assert_eq!(m.true_peak_db, -4.47);
        assert_eq!(m.loudness_range, 18.06);
        assert_eq!(m.threshold, -39.20);
        assert_eq!(m.target_offset, 0.58);
    }

    #[test]
    fn test_parse_non_finite_values() {
        let text = r#"{ "input_i" : "-inf", "input_tp" : "-3.00", "input_lra" : "0.00",
            "input_thresh" : "-inf", "target_offset" : "inf" }"#;
        let m = parse_measurement(text).unwrap();
        assert!(m.integrated_lufs.is_infinite() && m.integrated_lufs < 0.0);
        assert_eq!(m.true_peak_db, -3.0);
        assert!(m.target_offset.is_infinite());
    }

    #[test]
    fn test_parse_numeric_values() {
        let text = r#"{"input_i": -20.5, "input_tp": -2.0, "input_lra": 3.0,
            "input_thresh": -31.0, "target_offset": 0.1}"#;
        let m = parse_measurement(text).unwrap();
        assert_eq!(m.integrated_lufs, -20.5);
    }

    #[test]
    fn test_extract_uses_last_block() {
        let text = "{\"stale\": 1}\nnoise\n{\"fresh\": 2}\ntrailer";
        assert_eq!(extract_json_block(text), Some("{\"fresh\": 2}"));
    }

    #[test]
    fn test_extract_missing_braces() {
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("only close }"), None);
        // Opening brace after the last closing one does not count
        assert_eq!(extract_json_block("} then {"), None);
    }

    #[test]
    fn test_parse_rejects_incomplete_block() {
        assert!(parse_measurement("{ \"input_i\" : \"-20\" }").is_err());
        assert!(parse_measurement("{ \"input_i\" : \"loud\", \"input_tp\": \"0\", \"input_lra\": \"0\", \"input_thresh\": \"0\", \"target_offset\": \"0\" }").is_err());
        assert!(parse_measurement("").is_err());
    }
}
