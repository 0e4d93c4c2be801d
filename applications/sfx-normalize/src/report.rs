//! Human-readable run report
//!
//! Turns pipeline events into the inline console output. Diagnostics go
//! through tracing on stderr; this writes the report itself.

use sfx_loudness::{NormalizeConfig, NormalizeEvent, Regime, RunSummary};
use std::io::Write;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 60;

/// Format a level for display; non-finite values are shown verbatim
pub fn format_level(value: f64, unit: &str) -> String {
    if value.is_finite() {
        format!("{:+.1} {}", value, unit)
    } else {
        format!("{} {}", value, unit)
    }
}

/// Machine-readable run summary, one entry per file
///
/// Non-finite levels serialize as `null`.
pub fn summary_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// Path relative to `base` when it lives underneath it
pub fn display_path(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

pub struct ConsoleReporter<'a, W: Write> {
    out: W,
    config: &'a NormalizeConfig,
    base: PathBuf,
}

impl<'a, W: Write> ConsoleReporter<'a, W> {
    pub fn new(out: W, config: &'a NormalizeConfig, base: PathBuf) -> Self {
        Self { out, config, base }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Report output is best-effort; a closed stdout must not abort the run
    pub fn handle(&mut self, event: &NormalizeEvent<'_>) {
        let _ = self.write_event(event);
    }

    fn write_event(&mut self, event: &NormalizeEvent<'_>) -> std::io::Result<()> {
        match event {
            NormalizeEvent::RunStarted { total, options } => {
                let mode = if options.dry_run { "DRY RUN" } else { "NORMALIZING" };
                writeln!(self.out, "Target loudness: {} LUFS", self.config.target_lufs)?;
                writeln!(
                    self.out,
                    "Short-clip peak target: {} dBTP",
                    self.config.target_peak_db
                )?;
                writeln!(
                    self.out,
                    "True peak limit: {} dBTP",
                    self.config.true_peak_ceiling_db
                )?;
                writeln!(self.out, "Mode: {}", mode)?;
                if options.backup && !options.dry_run {
                    writeln!(self.out, "Backups: {}", self.config.backup_suffix)?;
                }
                writeln!(self.out, "Files: {}", total)?;
                writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
            }
            NormalizeEvent::FileStarted { file, .. } => {
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "  {}",
                    display_path(file.path(), &self.base).display()
                )?;
            }
            NormalizeEvent::Measured {
                measurement,
                regime,
                ..
            } => match regime {
                Regime::Lufs => writeln!(
                    self.out,
                    "    Current: {}  (peak: {:.2} dBTP, offset: {:.2} dB)",
                    format_level(measurement.integrated_lufs, "LUFS"),
                    measurement.true_peak_db,
                    measurement.target_offset
                )?,
                Regime::Peak => writeln!(
                    self.out,
                    "    Current: {} (too short for LUFS), peak: {}",
                    format_level(measurement.integrated_lufs, "LUFS"),
                    format_level(measurement.true_peak_db, "dBTP")
                )?,
                Regime::Unmeasurable => writeln!(
                    self.out,
                    "    Current: {}, peak: {}",
                    format_level(measurement.integrated_lufs, "LUFS"),
                    format_level(measurement.true_peak_db, "dBTP")
                )?,
            },
            NormalizeEvent::Skipped { plan, .. } => writeln!(
                self.out,
                "    Already within target ({:.1} dB off), skipping",
                plan.gap()
            )?,
            NormalizeEvent::Planned { plan, .. } => writeln!(
                self.out,
                "    Would normalize to {} {} ({:+.1} dB)",
                plan.target,
                plan.regime.unit(),
                plan.gain_db
            )?,
            NormalizeEvent::Applied { plan, .. } => writeln!(
                self.out,
                "    Applied {:+.1} dB ({} regime)",
                plan.gain_db, plan.regime
            )?,
            NormalizeEvent::Verified { measurement, .. } => {
                if measurement.integrated_lufs.is_finite() {
                    writeln!(
                        self.out,
                        "    Normalized: {}",
                        format_level(measurement.integrated_lufs, "LUFS")
                    )?;
                } else {
                    writeln!(
                        self.out,
                        "    Normalized: peak {}",
                        format_level(measurement.true_peak_db, "dBTP")
                    )?;
                }
            }
            NormalizeEvent::VerifyFailed { .. } => {
                writeln!(self.out, "    Normalized (unverified)")?;
            }
            NormalizeEvent::Failed { error, .. } => {
                writeln!(self.out, "    FAILED: {}", error)?;
            }
            NormalizeEvent::RunFinished { summary } => {
                writeln!(self.out)?;
                writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
                writeln!(
                    self.out,
                    "Done. {} processed, {} skipped, {} failed.",
                    summary.processed, summary.skipped, summary.failed
                )?;
            }
        }

        self.out.flush()
    }
}
