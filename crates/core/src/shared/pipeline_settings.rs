use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::capture_device::Facing;
use crate::shared::constants::{
    DEFAULT_COLLECTION, DEFAULT_IGNORE_LABEL, FACE_SCORE_THRESHOLD, LOG_INTERVAL_SECS,
    PREFERRED_RESOLUTIONS, SPOOF_THRESHOLD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Face box only, no domain action.
    FaceDetect,
    Enroll,
    Recognize,
    SpoofCheck,
    ObjectTag,
}

impl Mode {
    pub const ALL: &[Mode] = &[
        Mode::FaceDetect,
        Mode::Enroll,
        Mode::Recognize,
        Mode::SpoofCheck,
        Mode::ObjectTag,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::FaceDetect => "face_detect",
            Mode::Enroll => "enroll",
            Mode::Recognize => "recognize",
            Mode::SpoofCheck => "spoof_check",
            Mode::ObjectTag => "object_tag",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s || m.name().replace('_', "-") == s)
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("no configuration directory on this platform")]
    NoConfigDir,
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub mode: Mode,
    pub facing: Facing,
    pub preferred_resolutions: Vec<(u32, u32)>,
    pub face_score_threshold: f32,
    pub spoof_threshold: f32,
    pub collection: String,
    pub ignore_label: String,
    pub object_detection_enabled: bool,
    pub log_interval_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            mode: Mode::FaceDetect,
            facing: Facing::Front,
            preferred_resolutions: PREFERRED_RESOLUTIONS.to_vec(),
            face_score_threshold: FACE_SCORE_THRESHOLD,
            spoof_threshold: SPOOF_THRESHOLD,
            collection: DEFAULT_COLLECTION.to_string(),
            ignore_label: DEFAULT_IGNORE_LABEL.to_string(),
            object_detection_enabled: true,
            log_interval_secs: LOG_INTERVAL_SECS,
        }
    }
}

impl PipelineSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceStream").join("settings.json"))
    }

    /// Settings from the platform config dir, or defaults if absent or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring settings at {}: {e}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.mode, Mode::FaceDetect);
        assert_eq!(settings.facing, Facing::Front);
        assert_eq!(settings.preferred_resolutions[0], (1280, 720));
        assert_relative_eq!(settings.face_score_threshold, 0.9);
        assert_relative_eq!(settings.spoof_threshold, 0.5);
        assert_eq!(settings.collection, "DEMO");
        assert_eq!(settings.ignore_label, "person");
        assert_eq!(settings.log_interval_secs, 10);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = PipelineSettings {
            mode: Mode::SpoofCheck,
            facing: Facing::Back,
            collection: "STAFF".into(),
            ..PipelineSettings::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = PipelineSettings::load_from(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "mode": "recognize" }"#).unwrap();

        let loaded = PipelineSettings::load_from(&path).unwrap();

        assert_eq!(loaded.mode, Mode::Recognize);
        assert_eq!(loaded.collection, "DEMO");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PipelineSettings::load_from(&path),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PipelineSettings::load_from(&dir.path().join("absent.json")),
            Err(SettingsError::Io(_))
        ));
    }

    #[rstest]
    #[case("face_detect", Mode::FaceDetect)]
    #[case("enroll", Mode::Enroll)]
    #[case("spoof-check", Mode::SpoofCheck)]
    #[case("object_tag", Mode::ObjectTag)]
    fn test_mode_from_str(#[case] input: &str, #[case] expected: Mode) {
        assert_eq!(input.parse::<Mode>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_mode() {
        assert!("blur".parse::<Mode>().is_err());
    }
}
