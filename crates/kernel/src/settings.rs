use std::path::{Path, PathBuf};

use dunes_stream::StreamConfig;
use serde::{Deserialize, Serialize};

use crate::airplane::AirplaneConfig;
use crate::camera::CameraConfig;
use crate::canyon::CanyonConfig;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Where models come from and how fast they load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Directory holding `.gltf` files. Procedural stand-ins when unset.
    pub root: Option<PathBuf>,
    /// Loads completed per tick.
    pub loads_per_pump: usize,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: None,
            loads_per_pump: 4,
        }
    }
}

/// Everything the game reads at startup. Missing keys fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamConfig,
    pub airplane: AirplaneConfig,
    pub camera: CameraConfig,
    pub canyon: CanyonConfig,
    pub assets: AssetSettings,
}

impl Settings {
    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn to_yaml(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.stream
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        let a = &self.airplane;
        if a.min_altitude > a.max_altitude {
            return Err(SettingsError::Invalid(format!(
                "airplane altitude range [{}, {}] is empty",
                a.min_altitude, a.max_altitude
            )));
        }
        let c = &self.camera;
        if c.min_distance > c.max_distance {
            return Err(SettingsError::Invalid(format!(
                "camera distance range [{}, {}] is empty",
                c.min_distance, c.max_distance
            )));
        }
        if self.assets.loads_per_pump == 0 {
            return Err(SettingsError::Invalid("loads_per_pump must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip() {
        let mut settings = Settings::default();
        settings.stream.render_distance = 3;
        settings.stream.bounds = Some(500.0);
        settings.assets.root = Some(PathBuf::from("public/models"));
        let text = settings.to_yaml().unwrap();
        assert_eq!(Settings::from_yaml(&text).unwrap(), settings);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let text = "stream:\n  chunk_size: 64.0\n  props:\n    rocks:\n      count: 3\nairplane:\n  speed: 1.5\n";
        let settings = Settings::from_yaml(text).unwrap();
        assert_eq!(settings.stream.chunk_size, 64.0);
        assert_eq!(settings.stream.render_distance, 2);
        assert_eq!(settings.stream.props.rocks.count, 3);
        assert_eq!(settings.stream.props.cacti.count, 4);
        assert_eq!(settings.airplane.speed, 1.5);
        assert_eq!(settings.airplane.max_tilt, 0.3);
        assert_eq!(settings.camera.distance, 30.0);
    }

    #[test]
    fn invalid_values_rejected() {
        let err = Settings::from_yaml("stream:\n  chunk_size: -5.0\n").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        let err = Settings::from_yaml("camera:\n  min_distance: 90.0\n").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        let err = Settings::from_yaml("stream: [1, 2").unwrap_err();
        assert!(matches!(err, SettingsError::Yaml(_)));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dunes.yaml");
        let mut settings = Settings::default();
        settings.stream.seed = 42;
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap().stream.seed, 42);
        assert!(matches!(
            Settings::load(dir.path().join("missing.yaml")),
            Err(SettingsError::Io(_))
        ));
    }
}
