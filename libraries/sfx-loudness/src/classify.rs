//! Measurement regime selection

use crate::measure::LoudnessMeasurement;
use serde::Serialize;
use std::fmt;

/// Which statistic drives normalization for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Integrated loudness is finite and takes priority
    Lufs,
    /// Clip too short/quiet for integrated loudness; fall back to true peak
    Peak,
    /// Neither statistic is finite
    Unmeasurable,
}

impl Regime {
    /// Display unit for levels in this regime
    pub fn unit(&self) -> &'static str {
        match self {
            Regime::Lufs => "LUFS",
            Regime::Peak => "dBTP",
            Regime::Unmeasurable => "",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Lufs => f.write_str("lufs"),
            Regime::Peak => f.write_str("peak"),
            Regime::Unmeasurable => f.write_str("unmeasurable"),
        }
    }
}

/// Pick the regime for a measurement
///
/// Lufs whenever integrated loudness is finite, regardless of the peak.
pub fn classify(measurement: &LoudnessMeasurement) -> Regime {
    if measurement.integrated_lufs.is_finite() {
        Regime::Lufs
    } else if measurement.true_peak_db.is_finite() {
        Regime::Peak
    } else {
        Regime::Unmeasurable
    }
}
