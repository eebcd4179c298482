//! Session configuration
//!
//! Stored as YAML in the platform config directory
//! (`~/.config/wavemark/config.yaml` on Linux). Loading is forgiving: a
//! missing file means defaults, a malformed file logs a warning and falls
//! back to defaults; a broken config must never block annotation work.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::labels::RANGE_MATCH_TOLERANCE;

/// Session-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Extensions recognized when scanning a folder (lowercase, no dot)
    pub audio_extensions: Vec<String>,
    /// How close a selection must sit to a label's bounds (both of them)
    /// for edit/delete to target that label, in seconds
    pub range_match_tolerance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            audio_extensions: ["wav", "mp3", "flac", "aiff", "aif", "ogg", "m4a"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            range_match_tolerance: RANGE_MATCH_TOLERANCE,
        }
    }
}

/// Default config file path, `None` when the platform has no config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wavemark").join("config.yaml"))
}

/// Load configuration from a YAML file.
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} doesn't exist, using defaults", path);
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: Failed to parse {:?}: {}, using defaults", path, e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories as needed
pub fn save_config<T>(config: &T, path: &Path) -> Result<(), std::io::Error>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, yaml)?;

    log::info!("save_config: saved {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert!(config.audio_extensions.iter().any(|e| e == "wav"));
        assert_eq!(config.range_match_tolerance, 0.01);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: SessionConfig = load_config(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.range_match_tolerance, 0.01);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = SessionConfig::default();
        config.range_match_tolerance = 0.05;
        config.audio_extensions = vec!["wav".into()];

        save_config(&config, &path).unwrap();
        let loaded: SessionConfig = load_config(&path);

        assert_eq!(loaded.range_match_tolerance, 0.05);
        assert_eq!(loaded.audio_extensions, vec!["wav".to_string()]);
    }

    #[test]
    fn test_malformed_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "audio_extensions: {{{{").unwrap();

        let config: SessionConfig = load_config(&path);
        assert_eq!(config.range_match_tolerance, 0.01);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "range_match_tolerance: 0.02\n").unwrap();

        let config: SessionConfig = load_config(&path);
        assert_eq!(config.range_match_tolerance, 0.02);
        assert!(!config.audio_extensions.is_empty());
    }
}
