//! Loudness normalization for game audio assets
//!
//! This crate provides:
//! - Loudness/true-peak measurement through an external engine (ffmpeg loudnorm)
//! - Regime selection: integrated loudness, or true peak for very short clips
//! - Gain planning with a tolerance window
//! - Crash-safe in-place application (temp file + atomic rename, optional backup)
//! - Post-apply verification for reporting
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐     ┌─────────────┐
//! │ Audio File  │ ──► │  Measurer    │ ──► │  Classifier   │ ──► │  Planner    │
//! └─────────────┘     └──────────────┘     └───────────────┘     └─────────────┘
//!                            │                                          │
//!                            ▼                                          ▼
//!                     ┌──────────────┐     ┌───────────────┐     ┌─────────────┐
//!                     │LoudnessEngine│ ◄── │   Verifier    │ ◄── │  Applier    │
//!                     └──────────────┘     └───────────────┘     └─────────────┘
//! ```
//!
//! [`Normalizer`] sequences the stages one file at a time and aggregates
//! the outcomes into a [`RunSummary`].
//!
//! # Example
//!
//! ```ignore
//! use sfx_loudness::{AudioFile, FfmpegEngine, NormalizeConfig, Normalizer, RunOptions};
//!
//! let config = NormalizeConfig::load()?;
//! let engine = FfmpegEngine::new(config.ffmpeg_path.clone());
//! let normalizer = Normalizer::new(engine, config);
//!
//! let files = vec![AudioFile::from_path("assets/audio/jump.ogg")?];
//! let summary = normalizer.run(&files, RunOptions::default()).await?;
//! println!("{} processed, {} skipped, {} failed", summary.processed, summary.skipped, summary.failed);
//! ```

#![deny(unsafe_code)]

pub mod apply;
pub mod classify;
pub mod config;
pub mod engine;
mod error;
pub mod format;
pub mod measure;
pub mod pipeline;
pub mod plan;
pub mod verify;

pub use apply::{build_filter, Applier};
pub use classify::{classify, Regime};
pub use config::NormalizeConfig;
pub use engine::{EngineOutput, FfmpegEngine, FilterSpec, LoudnessEngine, MeasureRequest};
pub use error::{NormalizeError, Result};
pub use format::{AudioFile, AudioFormat, EncoderProfile};
pub use measure::{LoudnessMeasurement, Measurer};
pub use pipeline::{
    NormalizeEvent, Normalizer, ProcessingResult, ProcessingStatus, RunOptions, RunSummary,
};
pub use plan::{plan, Decision, NormalizationPlan, PlanTargets};
pub use verify::Verifier;
