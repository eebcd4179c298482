//! Working set discovery and navigation order
//!
//! The working set is the ordered list of audio files found under the opened
//! folder (recursively), plus the index of the file currently being
//! annotated. Ordering is lexicographic so stepping is deterministic across
//! sessions; stepping past either end wraps around.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Errors from working set discovery
#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("Not a folder: {0}")]
    NotAFolder(PathBuf),

    #[error("No audio files found under {0}")]
    NoAudioFiles(PathBuf),
}

/// Ordered audio file list with a current index
#[derive(Debug, Clone)]
pub struct WorkingSet {
    files: Vec<PathBuf>,
    current: usize,
}

impl WorkingSet {
    /// Recursively discover audio files under `folder`.
    ///
    /// Unreadable directory entries are skipped with a warning; an empty
    /// result is an error since there is nothing to annotate.
    pub fn scan(folder: &Path, extensions: &[String]) -> Result<Self, NavigatorError> {
        if !folder.is_dir() {
            return Err(NavigatorError::NotAFolder(folder.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(folder)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {:?}: {}", folder, e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_audio_file(p, extensions))
            .collect();

        if files.is_empty() {
            return Err(NavigatorError::NoAudioFiles(folder.to_path_buf()));
        }

        files.sort();
        log::info!("Working set: {} audio files under {:?}", files.len(), folder);

        Ok(Self { files, current: 0 })
    }

    /// Working set of exactly one file (the single-file open path)
    pub fn single(path: &Path) -> Self {
        Self {
            files: vec![path.to_path_buf()],
            current: 0,
        }
    }

    /// Path of the current file
    #[inline]
    pub fn current(&self) -> &Path {
        &self.files[self.current]
    }

    /// Index of the current file
    #[inline]
    pub fn position(&self) -> usize {
        self.current
    }

    /// Number of files in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Index after stepping forward, wrapping from the last file to the first
    pub fn next_index(&self) -> usize {
        (self.current + 1) % self.files.len()
    }

    /// Index after stepping backward, wrapping from the first file to the last
    pub fn previous_index(&self) -> usize {
        if self.current == 0 {
            self.files.len() - 1
        } else {
            self.current - 1
        }
    }

    /// Path at an index (panics on out-of-range, indices come from this set)
    #[inline]
    pub fn path_at(&self, index: usize) -> &Path {
        &self.files[index]
    }

    /// Move the current index (after the target file activated successfully)
    pub fn set_position(&mut self, index: usize) {
        debug_assert!(index < self.files.len());
        self.current = index;
    }
}

/// Extension-based audio file check, case-insensitive
pub fn is_audio_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use std::fs::File;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn exts() -> Vec<String> {
        SessionConfig::default().audio_extensions
    }

    #[test]
    fn test_scan_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.wav"));
        touch(&dir.path().join("a.wav"));
        touch(&dir.path().join("sub/c.wav"));
        touch(&dir.path().join("notes.txt"));

        let set = WorkingSet::scan(dir.path(), &exts()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.path_at(0).file_name().unwrap(), "a.wav");
        assert_eq!(set.path_at(1).file_name().unwrap(), "b.wav");
        assert_eq!(set.path_at(2).file_name().unwrap(), "c.wav");
        assert_eq!(set.position(), 0);
    }

    #[test]
    fn test_scan_empty_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WorkingSet::scan(dir.path(), &exts()),
            Err(NavigatorError::NoAudioFiles(_))
        ));
    }

    #[test]
    fn test_scan_missing_folder_fails() {
        assert!(matches!(
            WorkingSet::scan(Path::new("/nonexistent/folder"), &exts()),
            Err(NavigatorError::NotAFolder(_))
        ));
    }

    #[test]
    fn test_wrap_around_stepping() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.wav", "b.wav", "c.wav"] {
            touch(&dir.path().join(name));
        }
        let mut set = WorkingSet::scan(dir.path(), &exts()).unwrap();

        // Previous from 0 wraps to the last index
        assert_eq!(set.previous_index(), 2);

        set.set_position(2);
        // Next from the last index wraps to 0
        assert_eq!(set.next_index(), 0);

        // Stepping len() times returns to the origin
        set.set_position(0);
        for _ in 0..set.len() {
            let next = set.next_index();
            set.set_position(next);
        }
        assert_eq!(set.position(), 0);
    }

    #[test]
    fn test_is_audio_file() {
        let exts = exts();
        assert!(is_audio_file(Path::new("song.wav"), &exts));
        assert!(is_audio_file(Path::new("song.WAV"), &exts));
        assert!(is_audio_file(Path::new("song.flac"), &exts));
        assert!(!is_audio_file(Path::new("song.txt"), &exts));
        assert!(!is_audio_file(Path::new("song"), &exts));
    }
}
