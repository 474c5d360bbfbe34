use std::path::PathBuf;

use thiserror::Error;

/// The sensors command produced output that is not a usable report.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed sensors JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chip {chip}: {reason}")]
    Chip { chip: String, reason: String },
}

/// Why a single device was left out of a poll cycle.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{attribute} is not an integer: {value:?}")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("gpu_busy_percent out of range: {0}")]
    BusyOutOfRange(u32),

    #[error("invalid PCI class code: {0:?}")]
    InvalidClassCode(String),

    #[error("no sensor chip named {0} in the sensors report")]
    MissingSensorChip(String),
}

/// Errors that abort a whole poll cycle or prevent a monitor from starting.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("failed to run {program}: {source}")]
    SensorSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    SensorExit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("invalid sensors report: {0}")]
    SensorParse(#[from] ParseError),

    #[error("failed to list DRM devices under {}: {source}", .path.display())]
    DrmRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
