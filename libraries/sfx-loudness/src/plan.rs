//! Corrective gain planning

use crate::classify::Regime;
use crate::config::NormalizeConfig;
use crate::measure::LoudnessMeasurement;
use serde::Serialize;

/// Whether a file needs touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Already within tolerance
    Skip,
    Apply,
}

/// Planned correction for one file
///
/// Only ever built for [`Regime::Lufs`] or [`Regime::Peak`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizationPlan {
    pub regime: Regime,
    /// Level the regime measured (LUFS or dBTP)
    pub current: f64,
    /// Level the regime aims for
    pub target: f64,
    /// `target - current`, exact
    pub gain_db: f64,
    pub decision: Decision,
}

impl NormalizationPlan {
    /// Absolute distance from the target
    pub fn gap(&self) -> f64 {
        (self.current - self.target).abs()
    }

    pub fn is_skip(&self) -> bool {
        self.decision == Decision::Skip
    }
}

/// Targets and tolerance the planner works against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanTargets {
    pub lufs: f64,
    pub peak_db: f64,
    pub tolerance_db: f64,
}

impl From<&NormalizeConfig> for PlanTargets {
    fn from(config: &NormalizeConfig) -> Self {
        Self {
            lufs: config.target_lufs,
            peak_db: config.target_peak_db,
            tolerance_db: config.tolerance_db,
        }
    }
}

/// Plan the correction for a classified measurement
///
/// Returns `None` for [`Regime::Unmeasurable`]. A gap of exactly the
/// tolerance is applied, not skipped.
pub fn plan(
    measurement: &LoudnessMeasurement,
    regime: Regime,
    targets: &PlanTargets,
) -> Option<NormalizationPlan> {
    let (current, target) = match regime {
        Regime::Lufs => (measurement.integrated_lufs, targets.lufs),
        Regime::Peak => (measurement.true_peak_db, targets.peak_db),
        Regime::Unmeasurable => return None,
    };

    let decision = if (current - target).abs() < targets.tolerance_db {
        Decision::Skip
    } else {
        Decision::Apply
    };

    Some(NormalizationPlan {
        regime,
        current,
        target,
        gain_db: target - current,
        decision,
    })
}
