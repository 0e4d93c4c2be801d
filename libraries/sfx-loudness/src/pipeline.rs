//! Run orchestration
//!
//! Drives each file through measure → classify → plan → apply → verify, one
//! file at a time, and folds the outcomes into run totals. This is the only
//! stage that sequences I/O; classification and planning stay pure.
//!
//! Per file:
//!
//! ```text
//! Measuring → Classifying → Planning ─┬─► Skipped
//!     │             │                 └─► Applying → Verifying → Normalized
//!     └─────────────┴──────────────────────────┴──► Failed
//! ```

use crate::apply::Applier;
use crate::classify::{classify, Regime};
use crate::config::NormalizeConfig;
use crate::engine::LoudnessEngine;
use crate::error::{NormalizeError, Result};
use crate::format::AudioFile;
use crate::measure::{LoudnessMeasurement, Measurer};
use crate::plan::{plan as plan_correction, NormalizationPlan, PlanTargets};
use crate::verify::Verifier;
use serde::Serialize;
use std::path::PathBuf;
use tracing::Instrument;

/// Per-run switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after planning; never touch the filesystem
    pub dry_run: bool,
    /// Keep a copy of each original before replacing it
    pub backup: bool,
}

/// Final state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Normalized,
    Skipped,
    Failed,
}

/// Outcome of one file, with the measurements used for reporting
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub path: PathBuf,
    pub status: ProcessingStatus,
    pub plan: Option<NormalizationPlan>,
    pub before: Option<LoudnessMeasurement>,
    pub after: Option<LoudnessMeasurement>,
    /// Normalized only on paper (dry run)
    pub dry_run: bool,
    /// Why the file failed
    pub error: Option<String>,
    /// Why the post-apply measurement failed
    pub verify_error: Option<String>,
}

impl ProcessingResult {
    fn new(file: &AudioFile, status: ProcessingStatus) -> Self {
        Self {
            path: file.path().to_path_buf(),
            status,
            plan: None,
            before: None,
            after: None,
            dry_run: false,
            error: None,
            verify_error: None,
        }
    }

    /// Normalized on disk and re-measured successfully
    pub fn is_verified(&self) -> bool {
        self.status == ProcessingStatus::Normalized && !self.dry_run && self.after.is_some()
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Normalized files (planned ones in a dry run)
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<ProcessingResult>,
}

impl RunSummary {
    pub fn record(&mut self, result: ProcessingResult) {
        match result.status {
            ProcessingStatus::Normalized => self.processed += 1,
            ProcessingStatus::Skipped => self.skipped += 1,
            ProcessingStatus::Failed => self.failed += 1,
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Progress notifications for inline reporting
#[derive(Debug)]
pub enum NormalizeEvent<'a> {
    RunStarted {
        total: usize,
        options: RunOptions,
    },
    FileStarted {
        index: usize,
        file: &'a AudioFile,
    },
    Measured {
        file: &'a AudioFile,
        measurement: &'a LoudnessMeasurement,
        regime: Regime,
    },
    /// Within tolerance, left untouched
    Skipped {
        file: &'a AudioFile,
        plan: &'a NormalizationPlan,
    },
    /// Dry run: gain that would have been applied
    Planned {
        file: &'a AudioFile,
        plan: &'a NormalizationPlan,
    },
    Applied {
        file: &'a AudioFile,
        plan: &'a NormalizationPlan,
    },
    Verified {
        file: &'a AudioFile,
        measurement: &'a LoudnessMeasurement,
    },
    VerifyFailed {
        file: &'a AudioFile,
        error: &'a NormalizeError,
    },
    Failed {
        file: &'a AudioFile,
        error: &'a NormalizeError,
    },
    RunFinished {
        summary: &'a RunSummary,
    },
}

/// Sequential normalization orchestrator
pub struct Normalizer<E> {
    engine: E,
    config: NormalizeConfig,
}

impl<E: LoudnessEngine> Normalizer<E> {
    pub fn new(engine: E, config: NormalizeConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Process every file and return the run totals
    pub async fn run(&self, files: &[AudioFile], options: RunOptions) -> Result<RunSummary> {
        self.run_with_events(files, options, |_| {}).await
    }

    /// Like [`Normalizer::run`], reporting progress to `on_event`
    ///
    /// An unavailable engine aborts before any file is touched; individual
    /// file failures are recorded and the loop moves on.
    pub async fn run_with_events<F>(
        &self,
        files: &[AudioFile],
        options: RunOptions,
        mut on_event: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(&NormalizeEvent<'_>),
    {
        if let Err(e) = self.engine.check_available().await {
            tracing::error!("{}", e);
            return Err(e);
        }

        tracing::info!(
            "Normalizing {} file(s) (target {} LUFS, peak target {} dBTP, dry_run={}, backup={})",
            files.len(),
            self.config.target_lufs,
            self.config.target_peak_db,
            options.dry_run,
            options.backup
        );
        on_event(&NormalizeEvent::RunStarted {
            total: files.len(),
            options,
        });

        let mut summary = RunSummary::default();
        for (index, file) in files.iter().enumerate() {
            let span = tracing::info_span!("file", path = %file.path().display());
            let result = self
                .process_file(index, file, options, &mut on_event)
                .instrument(span)
                .await;
            summary.record(result);
        }

        tracing::info!(
            "Run finished: {} processed, {} skipped, {} failed",
            summary.processed,
            summary.skipped,
            summary.failed
        );
        on_event(&NormalizeEvent::RunFinished { summary: &summary });

        Ok(summary)
    }

    async fn process_file<F>(
        &self,
        index: usize,
        file: &AudioFile,
        options: RunOptions,
        on_event: &mut F,
    ) -> ProcessingResult
    where
        F: FnMut(&NormalizeEvent<'_>),
    {
        on_event(&NormalizeEvent::FileStarted { index, file });

        let measurer = Measurer::new(&self.engine, &self.config);
        let before = match measurer.measure(file, self.config.target_lufs).await {
            Ok(measurement) => measurement,
            Err(e) => {
                let result = ProcessingResult::new(file, ProcessingStatus::Failed);
                return failed(file, result, e, on_event);
            }
        };

        let regime = classify(&before);
        on_event(&NormalizeEvent::Measured {
            file,
            measurement: &before,
            regime,
        });

        let mut result = ProcessingResult::new(file, ProcessingStatus::Failed);
        result.before = Some(before);

        let Some(plan) = plan_correction(&before, regime, &PlanTargets::from(&self.config)) else {
            let error = NormalizeError::Unmeasurable(file.path().to_path_buf());
            return failed(file, result, error, on_event);
        };
        result.plan = Some(plan);

        if plan.is_skip() {
            tracing::info!(
                "Within {} dB of target ({} regime, gap {:.2}), skipping",
                self.config.tolerance_db,
                regime,
                plan.gap()
            );
            on_event(&NormalizeEvent::Skipped { file, plan: &plan });
            result.status = ProcessingStatus::Skipped;
            return result;
        }

        if options.dry_run {
            tracing::info!("Dry run: would apply {:+.2} dB ({} regime)", plan.gain_db, regime);
            on_event(&NormalizeEvent::Planned { file, plan: &plan });
            result.status = ProcessingStatus::Normalized;
            result.dry_run = true;
            return result;
        }

        let applier = Applier::new(&self.engine, &self.config);
        if let Err(e) = applier.apply(file, &plan, options.backup).await {
            return failed(file, result, e, on_event);
        }
        tracing::info!("Applied {:+.2} dB ({} regime)", plan.gain_db, regime);
        on_event(&NormalizeEvent::Applied { file, plan: &plan });
        result.status = ProcessingStatus::Normalized;

        let verifier = Verifier::new(&self.engine, &self.config);
        match verifier.verify(file, self.config.target_lufs).await {
            Ok(after) => {
                on_event(&NormalizeEvent::Verified {
                    file,
                    measurement: &after,
                });
                result.after = Some(after);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                on_event(&NormalizeEvent::VerifyFailed { file, error: &e });
                result.verify_error = Some(e.to_string());
            }
        }

        result
    }
}

fn failed<F>(
    file: &AudioFile,
    mut result: ProcessingResult,
    error: NormalizeError,
    on_event: &mut F,
) -> ProcessingResult
where
    F: FnMut(&NormalizeEvent<'_>),
{
    tracing::warn!("{}", error);
    on_event(&NormalizeEvent::Failed {
        file,
        error: &error,
    });
    result.status = ProcessingStatus::Failed;
    result.error = Some(error.to_string());
    result
}
