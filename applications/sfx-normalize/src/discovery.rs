//! Input discovery: explicit paths or the default audio directory

use sfx_loudness::format::is_supported;
use sfx_loudness::{AudioFile, NormalizeError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively find supported audio files, sorted by name within each directory
pub fn scan_directory(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_supported(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Expand explicit paths; directories are scanned, missing paths warned about
pub fn collect_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(scan_directory(path));
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            eprintln!("Warning: '{}' not found, skipping.", path.display());
        }
    }

    files
}

/// Resolve the run's inputs
///
/// With no explicit paths the default directory must exist.
pub fn discover(paths: &[PathBuf], default_dir: &Path) -> Result<Vec<PathBuf>, NormalizeError> {
    if paths.is_empty() {
        if !default_dir.is_dir() {
            return Err(NormalizeError::InputNotFound(default_dir.to_path_buf()));
        }
        return Ok(scan_directory(default_dir));
    }

    Ok(collect_paths(paths))
}

/// Wrap discovered paths, dropping (with a warning) unsupported extensions
pub fn to_audio_files(paths: Vec<PathBuf>) -> Vec<AudioFile> {
    paths
        .into_iter()
        .filter_map(|path| match AudioFile::from_path(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: {}, skipping.", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("b.wav"));
        touch(&root.join("a.OGG"));
        touch(&root.join("notes.txt"));
        touch(&root.join("c.mp3.bak"));
        touch(&root.join("ui/click.opus"));
        touch(&root.join("music/theme.mp3"));

        let files = scan_directory(root);
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.OGG"),
                PathBuf::from("b.wav"),
                PathBuf::from("music/theme.mp3"),
                PathBuf::from("ui/click.opus"),
            ]
        );
    }

    #[test]
    fn test_collect_mixes_files_and_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("sfx/jump.wav"));
        touch(&root.join("theme.ogg"));

        let files = collect_paths(&[
            root.join("theme.ogg"),
            root.join("missing.wav"),
            root.join("sfx"),
        ]);

        assert_eq!(files, vec![root.join("theme.ogg"), root.join("sfx/jump.wav")]);
    }

    #[test]
    fn test_discover_requires_default_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("assets/audio");

        let result = discover(&[], &missing);
        assert!(matches!(result, Err(NormalizeError::InputNotFound(_))));

        touch(&missing.join("hit.wav"));
        let files = discover(&[], &missing).unwrap();
        assert_eq!(files, vec![missing.join("hit.wav")]);
    }

    #[test]
    fn test_discover_empty_dir_is_ok() {
        let temp = TempDir::new().unwrap();
        assert!(discover(&[], temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_to_audio_files_drops_unsupported() {
        let files = to_audio_files(vec![
            PathBuf::from("a.wav"),
            PathBuf::from("b.flac"),
            PathBuf::from("c.opus"),
        ]);
        let paths: Vec<_> = files.iter().map(|f| f.path().to_path_buf()).collect();
        assert_eq!(paths, vec![PathBuf::from("a.wav"), PathBuf::from("c.opus")]);
    }
}
