//! Label sidecar persistence
//!
//! Each audio file's labels live in a JSON sidecar sharing its base name:
//! `take_031.wav` ↔ `take_031.json`. The record carries the clip metadata
//! alongside the labels so a sidecar is interpretable on its own:
//!
//! ```json
//! {
//!   "audio_file": "/captures/take_031.wav",
//!   "sample_rate": 16000,
//!   "duration": 4.25,
//!   "labels": [ { "start": 0.5, "end": 1.0, "label": "speech" } ]
//! }
//! ```
//!
//! A missing sidecar is the normal "no prior annotations" case, not an
//! error. A malformed one is reported as corrupt so the caller can fall
//! back to an empty label set instead of failing the file activation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::labels::Label;

/// Errors from sidecar IO
#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("Malformed sidecar {path}: {message}")]
    CorruptRecord { path: PathBuf, message: String },

    #[error("Sidecar IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk projection of a label set plus its clip's metadata.
///
/// Every field is defaulted on load: older records wrote the duration under
/// a different key, and a record without a `labels` array means "no labels".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationRecord {
    pub audio_file: String,
    pub sample_rate: u32,
    pub duration: f64,
    pub labels: Vec<Label>,
}

/// Sidecar path for an audio file: same base name, `json` extension
pub fn sidecar_path(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("json")
}

/// Write a record as pretty-printed JSON
pub fn save(path: &Path, record: &AnnotationRecord) -> Result<(), SidecarError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| SidecarError::CorruptRecord {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    std::fs::write(path, json)?;
    log::debug!("Saved sidecar {:?}", path);
    Ok(())
}

/// Read a record back. `Ok(None)` when the sidecar does not exist.
pub fn load(path: &Path) -> Result<Option<AnnotationRecord>, SidecarError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let record = serde_json::from_str(&contents).map_err(|e| SidecarError::CorruptRecord {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AnnotationRecord {
        AnnotationRecord {
            audio_file: "/captures/take_031.wav".to_string(),
            sample_rate: 16000,
            duration: 4.25,
            labels: vec![
                Label { start: 0.5, end: 1.0, text: "speech".into() },
                Label { start: 2.0, end: 3.5, text: "door slam".into() },
            ],
        }
    }

    #[test]
    fn test_sidecar_path_replaces_extension() {
        assert_eq!(
            sidecar_path(Path::new("/captures/take_031.wav")),
            PathBuf::from("/captures/take_031.json")
        );
        assert_eq!(
            sidecar_path(Path::new("clip.flac")),
            PathBuf::from("clip.json")
        );
    }

    #[test]
    fn test_roundtrip_preserves_labels_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take_031.json");

        let original = record();
        save(&path, &original).unwrap();
        let loaded = load(&path).unwrap().unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_wire_format_uses_label_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take_031.json");
        save(&path, &record()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"label\": \"speech\""));
        assert!(raw.contains("\"duration\": 4.25"));
        assert!(!raw.contains("\"text\""));
    }

    #[test]
    fn test_missing_sidecar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_corrupt_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load(&path),
            Err(SidecarError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_missing_labels_array_parses_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        // Legacy writer used a different duration key and no labels array
        std::fs::write(
            &path,
            r#"{"audio_file": "a.wav", "sample_rate": 8000, "duration/s": 2.0}"#,
        )
        .unwrap();

        let record = load(&path).unwrap().unwrap();
        assert!(record.labels.is_empty());
        assert_eq!(record.sample_rate, 8000);
        assert_eq!(record.duration, 0.0);
    }
}
