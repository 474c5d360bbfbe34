//! AMD GPU telemetry for Linux.
//!
//! Utilization and VRAM counters come from the amdgpu attributes under
//! `/sys/class/drm/cardN/device/`, temperatures, fan and power from
//! `sensors -j`. A [`GpuMonitor`] poll joins both into a [`DeviceInfoList`].

pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod observer;
pub mod sensors;
pub mod sysfs;

pub use config::MonitorConfig;
pub use data::{DeviceInfo, DeviceInfoList, GpuStats, SensorChip, SensorReport};
pub use error::{DeviceError, MonitorError, MonitorResult, ParseError};
pub use monitor::{create_monitor, AmdGpuMonitor, GpuMonitor};
pub use observer::{MonitorObserver, TracingObserver};
pub use sensors::{parse_sensor_report, SensorSource, SensorsCommand};
pub use sysfs::{sensor_chip_name, DrmEnumerator};
