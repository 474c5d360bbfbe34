//! lm-sensors integration: running `sensors -j` and turning its output into a
//! [`SensorReport`] of AMD GPU chips.
//!
//! The JSON is keyed by chip name. Each chip holds an `Adapter` string and one
//! object per sensor label, e.g. `"edge": {"temp1_input": 33.0, ...}`. Labels
//! vary between boards and kernels (`PPT`, `slowPPT`), so readings are looked
//! up by their reading key instead.

use crate::config::MonitorConfig;
use crate::data::{SensorChip, SensorReport};
use crate::error::{MonitorError, MonitorResult, ParseError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::process::Command;

/// Prefix of every chip exposed by the amdgpu hwmon driver.
pub const AMDGPU_CHIP_PREFIX: &str = "amdgpu-";

#[derive(Deserialize)]
struct RawChip {
    #[serde(rename = "Adapter", default)]
    adapter: String,
    #[serde(flatten)]
    labels: BTreeMap<String, Value>,
}

impl RawChip {
    fn reading(&self, key: &str) -> Option<f64> {
        self.labels
            .values()
            .filter_map(Value::as_object)
            .find_map(|readings| readings.get(key).and_then(Value::as_f64))
    }

    fn into_chip(self) -> SensorChip {
        SensorChip {
            voltage: self.reading("in0_input").unwrap_or(0.0),
            fan_rpm: self.reading("fan1_input").unwrap_or(0.0),
            temp_edge: self.reading("temp1_input").unwrap_or(0.0),
            temp_junction: self.reading("temp2_input").unwrap_or(0.0),
            temp_mem: self.reading("temp3_input").unwrap_or(0.0),
            // newer kernels report power1_input instead of power1_average
            power_average: self
                .reading("power1_average")
                .or_else(|| self.reading("power1_input"))
                .unwrap_or(0.0),
            adapter: self.adapter,
        }
    }
}

/// Parses `sensors -j` output, keeping only `amdgpu-*` chips.
///
/// Fails as a whole if the document is not an object of objects or an AMD chip
/// does not decode. Readings a chip does not report are left at zero.
pub fn parse_sensor_report(bytes: &[u8]) -> Result<SensorReport, ParseError> {
    let raw: HashMap<String, Map<String, Value>> = serde_json::from_slice(bytes)?;

    let mut chips = HashMap::new();
    for (name, body) in raw {
        if !name.starts_with(AMDGPU_CHIP_PREFIX) {
            continue;
        }
        let chip: RawChip =
            serde_json::from_value(Value::Object(body)).map_err(|e| ParseError::Chip {
                chip: name.clone(),
                reason: e.to_string(),
            })?;
        chips.insert(name, chip.into_chip());
    }

    Ok(SensorReport::new(chips))
}

/// Where the raw sensors JSON of a poll cycle comes from.
pub trait SensorSource: Send + Sync {
    fn read(&self) -> MonitorResult<Vec<u8>>;
}

/// Runs the sensors program and captures its stdout.
#[derive(Clone, Debug)]
pub struct SensorsCommand {
    program: String,
    args: Vec<String>,
}

impl SensorsCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.sensors_program.clone(), config.sensors_args.clone())
    }
}

impl SensorSource for SensorsCommand {
    fn read(&self) -> MonitorResult<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| MonitorError::SensorSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(MonitorError::SensorExit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
