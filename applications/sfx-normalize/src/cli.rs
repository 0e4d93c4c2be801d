/// Command-line arguments
use clap::Parser;
use sfx_loudness::NormalizeConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sfx-normalize")]
#[command(
    about = "Normalize audio files to consistent perceived loudness (EBU R128 / LUFS, true peak for short clips)",
    long_about = None
)]
pub struct Cli {
    /// Target loudness in LUFS [default: -18]
    #[arg(long, allow_negative_numbers = true)]
    pub target: Option<f64>,

    /// Target true peak in dBTP for clips too short for LUFS [default: -3]
    #[arg(long, allow_negative_numbers = true)]
    pub peak_target: Option<f64>,

    /// Measure and report loudness without modifying files
    #[arg(long)]
    pub dry_run: bool,

    /// Keep original files as .bak before overwriting
    #[arg(long)]
    pub backup: bool,

    /// Configuration file (default: ./sfx-normalize.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Print the run summary as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Specific files or directories to process (default: assets/audio/)
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Flags win over file and environment settings
    pub fn apply_overrides(&self, config: &mut NormalizeConfig) {
        if let Some(target) = self.target {
            config.target_lufs = target;
        }
        if let Some(peak_target) = self.peak_target {
            config.target_peak_db = peak_target;
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.ffmpeg_path = ffmpeg.clone();
        }
    }
}
