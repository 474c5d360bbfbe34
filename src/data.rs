use serde::Serialize;
use std::collections::HashMap;

// Readings of one hwmon chip as reported by `sensors -j`
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SensorChip {
    pub adapter: String,
    pub voltage: f64,         // vddgfx (V)
    pub fan_rpm: f64,         // fan1 (RPM)
    pub temp_edge: f64,       // edge (°C)
    pub temp_junction: f64,   // junction (°C)
    pub temp_mem: f64,        // mem (°C)
    pub power_average: f64,   // PPT (W)
}

// AMD chips from one sensors report, keyed by chip name (`amdgpu-pci-0300`)
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SensorReport {
    chips: HashMap<String, SensorChip>,
}

impl SensorReport {
    pub fn new(chips: HashMap<String, SensorChip>) -> Self {
        Self { chips }
    }

    pub fn get(&self, chip: &str) -> Option<&SensorChip> {
        self.chips.get(chip)
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }
}

// GPU statistics, one snapshot per poll cycle
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GpuStats {
    pub gpu_usage: u32,                  // gpu_busy_percent (0-100)
    pub vram_used: u64,                  // bytes
    pub vram_total: u64,                 // bytes
    pub temp_edge: f64,                  // °C
    pub temp_junction: f64,              // °C
    pub temp_mem: f64,                   // °C
    pub gpu_clock_mhz: Option<u32>,      // active pp_dpm_sclk level
    pub memory_clock_mhz: Option<u32>,   // active pp_dpm_mclk level
    pub fan_rpm: f64,
    pub power_watts: f64,
}

impl GpuStats {
    /// VRAM utilization in percent, 0.0 when the total is unknown.
    pub fn memory_usage(&self) -> f64 {
        if self.vram_total == 0 {
            return 0.0;
        }
        self.vram_used as f64 / self.vram_total as f64 * 100.0
    }
}

// One physical GPU found under the DRM class directory
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub name: String,        // `card0`
    pub device_id: String,   // raw `device` attribute
    pub class: String,       // raw `class` attribute
    pub sensor_chip: String, // derived from `class`
    pub driver: Option<String>,
    pub pci_slot: Option<String>, // `0000:03:00.0`
    pub stats: GpuStats,
}

// Devices of one poll cycle in discovery order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeviceInfoList {
    pub items: Vec<DeviceInfo>,
}

impl DeviceInfoList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceInfo> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|d| d.name.as_str()).collect()
    }
}
