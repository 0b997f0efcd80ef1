use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use log::info;

use crate::landmarks::Arm;
use crate::report::DEFAULT_TARGET_REPS;
use crate::reps::{Thresholds, DEFAULT_EXTENSION_DEG, DEFAULT_FLEXION_DEG};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera_id: i32,
    pub model_path: String,
    pub arm: Arm,
    pub extension_threshold_deg: f32,
    pub flexion_threshold_deg: f32,
    /// Landmarks below this visibility count as not detected.
    pub min_visibility: f32,
    /// Whole-pose presence score below which a frame has no detection.
    pub min_presence: f32,
    pub frame_interval_ms: u64,
    pub target_reps: u32,
    pub store_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_id: 0,
            model_path: "models/pose_landmark_full.onnx".to_string(),
            arm: Arm::Left,
            extension_threshold_deg: DEFAULT_EXTENSION_DEG,
            flexion_threshold_deg: DEFAULT_FLEXION_DEG,
            min_visibility: 0.5,
            min_presence: 0.5,
            frame_interval_ms: 20,
            target_reps: DEFAULT_TARGET_REPS,
            store_path: "exercise_sessions.json".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validated phase thresholds. A bad pair is a startup error.
    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::new(self.extension_threshold_deg, self.flexion_threshold_deg)
            .context("invalid rep thresholds in config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("curl-sentinel.toml");
        let config = Config {
            arm: Arm::Right,
            target_reps: 20,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("curl-sentinel.toml");
        fs::write(
            &path,
            "arm = \"right\"\nflexion_threshold_deg = 40.0\nmin_presence = 0.8\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.arm, Arm::Right);
        assert_eq!(config.flexion_threshold_deg, 40.0);
        assert_eq!(config.extension_threshold_deg, DEFAULT_EXTENSION_DEG);
        assert_eq!(config.target_reps, 12);
        assert_eq!(config.min_presence, 0.8);
        assert_eq!(config.min_visibility, 0.5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = Config {
            extension_threshold_deg: 30.0,
            flexion_threshold_deg: 160.0,
            ..Config::default()
        };
        assert!(config.thresholds().is_err());
        assert!(Config::default().thresholds().is_ok());
    }
}
