use crate::error::{MonitorError, MonitorResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DRM_ROOT: &str = "/sys/class/drm";
pub const DEFAULT_SENSORS_PROGRAM: &str = "sensors";

/// Read-only settings shared by every poll cycle.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Directory holding the `cardN` device entries.
    pub drm_root: PathBuf,
    pub sensors_program: String,
    /// Must make the program print JSON.
    pub sensors_args: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            drm_root: PathBuf::from(DEFAULT_DRM_ROOT),
            sensors_program: DEFAULT_SENSORS_PROGRAM.to_string(),
            sensors_args: vec!["-j".to_string()],
        }
    }
}

impl MonitorConfig {
    pub fn from_file(path: &Path) -> MonitorResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| MonitorError::Config(format!("{}: {e}", path.display())))
    }

    pub fn with_drm_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.drm_root = root.into();
        self
    }

    pub fn with_sensors_program(mut self, program: impl Into<String>) -> Self {
        self.sensors_program = program.into();
        self
    }
}
