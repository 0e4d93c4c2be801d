//! Supported audio formats and their encoder profiles

use crate::error::{NormalizeError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Container/codec families the pipeline can round-trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    Ogg,
    Mp3,
    Opus,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Opus => "opus",
        }
    }

    /// Parse from a file extension (case-insensitive, without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "ogg" => Some(AudioFormat::Ogg),
            "mp3" => Some(AudioFormat::Mp3),
            "opus" => Some(AudioFormat::Opus),
            _ => None,
        }
    }

    /// Detect the format of a path from its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Encoder settings that keep the original container type
    ///
    /// Uncompressed formats stay lossless PCM.
    pub fn encoder_profile(&self) -> EncoderProfile {
        let args: &'static [&'static str] = match self {
            AudioFormat::Wav => &["-c:a", "pcm_s16le"],
            AudioFormat::Ogg => &["-c:a", "libvorbis", "-q:a", "6"],
            AudioFormat::Mp3 => &["-c:a", "libmp3lame", "-q:a", "2"],
            AudioFormat::Opus => &["-c:a", "libopus", "-b:a", "128k"],
        };
        EncoderProfile {
            format: *self,
            args,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output codec parameters for one format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderProfile {
    pub format: AudioFormat,
    /// Engine arguments selecting codec and quality
    pub args: &'static [&'static str],
}

/// An audio asset moving through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    path: PathBuf,
    format: AudioFormat,
}

impl AudioFile {
    /// Build from a path, rejecting unsupported extensions
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = AudioFormat::from_path(&path)
            .ok_or_else(|| NormalizeError::UnsupportedFormat(path.display().to_string()))?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Sibling path holding the pre-normalization copy
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// Check if a path has a supported audio extension
pub fn is_supported(path: &Path) -> bool {
    AudioFormat::from_path(path).is_some()
}
