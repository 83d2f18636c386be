use catalog::{ManifestLoader, ManifestSource};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::playback::StepPolicy;
use crate::resolver::Addressing;

pub const DEFAULT_CONFIG_FILE: &str = "viewer.json";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cadence_ms must be greater than zero")]
    InvalidCadence,

    #[error("invalid step policy: {0}")]
    InvalidStep(String),
}

/// Deployment settings. Every field has a default, so an empty object (or
/// no file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Primary manifest: URL, file path, or `embedded`.
    pub manifest: String,
    /// Tried when the primary manifest can't be loaded.
    pub fallback_manifest: Option<String>,
    pub addressing: Addressing,
    pub step_policy: StepPolicy,
    /// Playback cadence in milliseconds.
    pub cadence_ms: u64,
    pub reset_hour_on_cycle_change: bool,
    /// Directory relative frame locators are read from.
    pub frames_root: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            manifest: "manifest.json".to_string(),
            fallback_manifest: Some("embedded".to_string()),
            addressing: Addressing::default(),
            step_policy: StepPolicy::default(),
            cadence_ms: 500,
            reset_hour_on_cycle_change: false,
            frames_root: PathBuf::from("."),
        }
    }
}

impl ViewerConfig {
    /// Reads `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("{} not found, using default viewer settings", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cadence_ms == 0 {
            return Err(ConfigError::InvalidCadence);
        }
        if let StepPolicy::HourValue {
            fine_step,
            coarse_step,
            ..
        } = self.step_policy
        {
            if fine_step == 0 || coarse_step == 0 {
                return Err(ConfigError::InvalidStep(
                    "fine_step and coarse_step must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn manifest_loader(&self) -> ManifestLoader {
        let loader = ManifestLoader::new(ManifestSource::parse(&self.manifest));
        match &self.fallback_manifest {
            Some(fallback) => loader.with_fallback(ManifestSource::parse(fallback)),
            None => loader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.cadence(), Duration::from_millis(500));
        assert_eq!(config.addressing, Addressing::Hourly);
        assert!(!config.reset_hour_on_cycle_change);
    }

    #[test]
    fn reads_every_field() {
        let config = ViewerConfig::from_json(
            r#"{
                "manifest": "https://example.org/manifest.json",
                "fallback_manifest": null,
                "addressing": "timestamped",
                "step_policy": {"kind": "cyclic"},
                "cadence_ms": 350,
                "reset_hour_on_cycle_change": true,
                "frames_root": "/srv/frames"
            }"#,
        )
        .unwrap();
        assert_eq!(config.addressing, Addressing::Timestamped);
        assert_eq!(config.step_policy, StepPolicy::Cyclic);
        assert_eq!(config.cadence(), Duration::from_millis(350));
        assert!(config.reset_hour_on_cycle_change);
        assert_eq!(config.frames_root, PathBuf::from("/srv/frames"));

        let loader = config.manifest_loader();
        assert_eq!(
            loader.primary(),
            &ManifestSource::Url("https://example.org/manifest.json".into())
        );
        assert!(loader.fallback().is_none());
    }

    #[test]
    fn rejects_zero_cadence_and_zero_steps() {
        assert!(matches!(
            ViewerConfig::from_json(r#"{"cadence_ms": 0}"#),
            Err(ConfigError::InvalidCadence)
        ));
        assert!(matches!(
            ViewerConfig::from_json(r#"{"step_policy": {"kind": "hour_value", "fine_step": 0}}"#),
            Err(ConfigError::InvalidStep(_))
        ));
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(
            config.manifest_loader().fallback(),
            Some(&ManifestSource::Embedded)
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"cadence_ms": 600, "addressing": "hourly"}"#)
            .unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.cadence_ms, 600);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"cadence_ms = 600").unwrap();
        assert!(matches!(
            ViewerConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
