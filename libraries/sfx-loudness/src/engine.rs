//! Loudness engine capability
//!
//! The pipeline never runs an external process directly. It talks to a
//! [`LoudnessEngine`], which measures loudness statistics and renders filter
//! chains. [`FfmpegEngine`] is the production backend; tests substitute a
//! scripted engine.

use crate::error::{NormalizeError, Result};
use crate::format::EncoderProfile;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Parameters for a measurement pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureRequest {
    /// Integrated loudness target (LUFS); only affects the reported offset
    pub target_lufs: f64,
    /// True peak ceiling (dBTP)
    pub true_peak_db: f64,
    /// Loudness range target
    pub loudness_range: f64,
}

/// An engine filter chain, already rendered to the engine's syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec(String);

impl FilterSpec {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    /// Whether the engine exited with a zero status
    pub success: bool,
    /// Free-form diagnostic text (stderr for ffmpeg)
    pub diagnostics: String,
}

impl EngineOutput {
    pub fn success(diagnostics: impl Into<String>) -> Self {
        Self {
            success: true,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn failure(diagnostics: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostics: diagnostics.into(),
        }
    }

    /// Last non-empty diagnostic line, for error messages
    pub fn last_line(&self) -> &str {
        self.diagnostics
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }
}

/// External audio-processing engine
///
/// Every call is awaited to completion before the pipeline moves on; no
/// timeout is enforced.
#[async_trait]
pub trait LoudnessEngine: Send + Sync {
    /// Confirm the engine can be invoked at all
    ///
    /// # Errors
    /// Returns [`NormalizeError::EngineUnavailable`] when it cannot
    async fn check_available(&self) -> Result<()>;

    /// Run a measurement pass; the statistics are embedded in the diagnostics
    async fn measure(&self, input: &Path, request: &MeasureRequest) -> Result<EngineOutput>;

    /// Render `input` through `filter` into `output` using `profile`
    async fn apply_filter(
        &self,
        input: &Path,
        filter: &FilterSpec,
        profile: &EncoderProfile,
        output: &Path,
    ) -> Result<EngineOutput>;
}

/// FFmpeg-backed engine (loudnorm for measurement, volume+alimiter for gain)
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_path: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// loudnorm filter for a measurement-only pass
    pub fn measure_filter(request: &MeasureRequest) -> String {
        format!(
            "loudnorm=I={}:TP={}:LRA={}:print_format=json",
            request.target_lufs, request.true_peak_db, request.loudness_range
        )
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-hide_banner")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    async fn run(mut cmd: Command) -> Result<EngineOutput> {
        let output = cmd.output().await?;
        let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();

        Ok(EngineOutput {
            success: output.status.success(),
            diagnostics,
        })
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl LoudnessEngine for FfmpegEngine {
    async fn check_available(&self) -> Result<()> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                NormalizeError::EngineUnavailable(format!(
                    "cannot run {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(NormalizeError::EngineUnavailable(format!(
                "{} -version exited with {}",
                self.ffmpeg_path.display(),
                output.status
            )));
        }

        Ok(())
    }

    async fn measure(&self, input: &Path, request: &MeasureRequest) -> Result<EngineOutput> {
        let filter = Self::measure_filter(request);
        tracing::debug!("ffmpeg measure {} -af {}", input.display(), filter);

        let mut cmd = self.command();
        cmd.arg("-nostats")
            .arg("-i")
            .arg(input)
            .arg("-af")
            .arg(&filter)
            .arg("-f")
            .arg("null")
            .arg("-");

        Self::run(cmd).await
    }

    async fn apply_filter(
        &self,
        input: &Path,
        filter: &FilterSpec,
        profile: &EncoderProfile,
        output: &Path,
    ) -> Result<EngineOutput> {
        tracing::debug!(
            "ffmpeg apply {} -af {} {:?} -> {}",
            input.display(),
            filter,
            profile.args,
            output.display()
        );

        let mut cmd = self.command();
        cmd.arg("-y") // Output is a freshly created temp file
            .arg("-i")
            .arg(input)
            .arg("-af")
            .arg(filter.as_str())
            .args(profile.args)
            .arg("-f")
            .arg(muxer_name(profile))
            .arg(output);

        Self::run(cmd).await
    }
}

/// Explicit muxer, since temp file names carry a random component
fn muxer_name(profile: &EncoderProfile) -> &'static str {
    use crate::format::AudioFormat;
    match profile.format {
        AudioFormat::Wav => "wav",
        AudioFormat::Ogg => "ogg",
        AudioFormat::Mp3 => "mp3",
        AudioFormat::Opus => "opus",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::AudioFormat;

    #[test]
    fn test_measure_filter() {
        let request = MeasureRequest {
            target_lufs: -18.0,
            true_peak_db: -1.0,
            loudness_range: 11.0,
        };
        assert_eq!(
            FfmpegEngine::measure_filter(&request),
            "loudnorm=I=-18:TP=-1:LRA=11:print_format=json"
        );
    }

    #[test]
    fn test_last_line() {
        let output = EngineOutput::failure("first\nError opening output file\n\n");
        assert_eq!(output.last_line(), "Error opening output file");
        assert_eq!(EngineOutput::success("").last_line(), "");
    }

    #[test]
    fn test_muxer_matches_format() {
        assert_eq!(muxer_name(&AudioFormat::Wav.encoder_profile()), "wav");
        assert_eq!(muxer_name(&AudioFormat::Opus.encoder_profile()), "opus");
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = FfmpegEngine::new("/nonexistent/bin/ffmpeg-sfx-test");
        let result = engine.check_available().await;
        assert!(matches!(result, Err(NormalizeError::EngineUnavailable(_))));
    }
}
