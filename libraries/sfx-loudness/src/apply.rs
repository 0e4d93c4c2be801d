//! Gain application with crash-safe file replacement
//!
//! The engine renders into a temp file created next to the original. Only
//! after it exits cleanly is the original (optionally) backed up and then
//! replaced by an atomic rename. The temp file is a [`TempPath`], so every
//! early return removes it.

use crate::config::NormalizeConfig;
use crate::engine::{FilterSpec, LoudnessEngine};
use crate::error::{NormalizeError, Result};
use crate::format::AudioFile;
use crate::plan::{Decision, NormalizationPlan};
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Single-pass gain followed by a hard true-peak limiter
///
/// `volume` takes the exact planned gain; `alimiter` clamps transients the
/// gain pushes past the ceiling. Auto-leveling stays off so the limiter only
/// ever reduces.
pub fn build_filter(gain_db: f64, config: &NormalizeConfig) -> FilterSpec {
    FilterSpec::new(format!(
        "volume={}dB,alimiter=limit={:.6}:attack={}:release={}:level=false",
        gain_db,
        config.ceiling_linear(),
        config.limiter_attack_ms,
        config.limiter_release_ms
    ))
}

/// Executes normalization plans against files on disk
pub struct Applier<'a> {
    engine: &'a dyn LoudnessEngine,
    config: &'a NormalizeConfig,
}

impl<'a> Applier<'a> {
    pub fn new(engine: &'a dyn LoudnessEngine, config: &'a NormalizeConfig) -> Self {
        Self { engine, config }
    }

    /// Apply `plan` to `file` in place
    ///
    /// On any error the original is left byte-for-byte unchanged and no temp
    /// file remains. With `keep_backup`, the original is copied to
    /// `<path><backup_suffix>` before promotion.
    pub async fn apply(
        &self,
        file: &AudioFile,
        plan: &NormalizationPlan,
        keep_backup: bool,
    ) -> Result<()> {
        let path = file.path();
        let apply_error = |reason: String| NormalizeError::Apply {
            path: path.to_path_buf(),
            reason,
        };

        if plan.decision != Decision::Apply {
            return Err(apply_error("plan does not call for a change".to_string()));
        }

        let filter = build_filter(plan.gain_db, self.config);
        let profile = file.format().encoder_profile();
        let temp = create_sibling_temp(file)?;

        tracing::debug!(
            "Rendering {} via {} into {}",
            path.display(),
            filter,
            temp.display()
        );

        let output = match self
            .engine
            .apply_filter(path, &filter, &profile, &temp)
            .await
        {
            Ok(output) => output,
            Err(e) => return Err(apply_error(e.to_string())),
        };

        if !output.success {
            discard(temp);
            return Err(apply_error(format!(
                "engine exited with an error: {}",
                output.last_line()
            )));
        }

        if keep_backup {
            let backup = file.backup_path(&self.config.backup_suffix);
            copy_with_metadata(path, &backup)?;
            tracing::debug!("Backed up {} to {}", path.display(), backup.display());
        }

        // Rendered output inherits the original's permissions, not the temp file's 0600
        let permissions = fs::metadata(path)?.permissions();
        fs::set_permissions(&temp, permissions)?;

        temp.persist(path).map_err(|e| NormalizeError::Io(e.error))?;
        Ok(())
    }
}

/// Create an empty temp file in the original's directory (same filesystem)
fn create_sibling_temp(file: &AudioFile) -> Result<TempPath> {
    let dir = match file.path().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".sfx-normalize-")
        .suffix(&format!(".{}", file.format().extension()))
        .tempfile_in(dir)?;

    // Close our handle; the engine opens the path itself
    Ok(temp.into_temp_path())
}

fn discard(temp: TempPath) {
    let temp_path = temp.to_path_buf();
    if let Err(e) = temp.close() {
        tracing::warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
    }
}

/// Copy a file, carrying over permissions and access/modification times
pub fn copy_with_metadata(source: &Path, dest: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    fs::copy(source, dest)?;

    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    File::options().write(true).open(dest)?.set_times(times)?;

    Ok(())
}
