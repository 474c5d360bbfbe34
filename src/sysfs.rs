//! DRM sysfs access: finding `cardN` devices and reading their amdgpu
//! attribute files.

use crate::config::MonitorConfig;
use crate::error::{DeviceError, MonitorError, MonitorResult};
use crate::observer::MonitorObserver;
use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const ATTR_DEVICE: &str = "device";
const ATTR_CLASS: &str = "class";
const ATTR_GPU_BUSY: &str = "gpu_busy_percent";
const ATTR_VRAM_USED: &str = "mem_info_vram_used";
const ATTR_VRAM_TOTAL: &str = "mem_info_vram_total";
const ATTR_SCLK: &str = "pp_dpm_sclk";
const ATTR_MCLK: &str = "pp_dpm_mclk";
const ATTR_DRIVER: &str = "driver";
const ATTR_UEVENT: &str = "uevent";

const SENSOR_CHIP_PREFIX: &str = "amdgpu-pci-";

/// Raw attributes of one `cardN` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct CardAttributes {
    pub name: String,
    pub device_id: String,
    pub class: String,
    pub gpu_busy_percent: u32,
    pub vram_used: u64,
    pub vram_total: u64,
    pub gpu_clock_mhz: Option<u32>,
    pub memory_clock_mhz: Option<u32>,
    pub driver: Option<String>,
    pub pci_slot: Option<String>,
}

pub struct DrmEnumerator {
    root: PathBuf,
}

impl DrmEnumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.drm_root.clone())
    }

    /// Names of the `cardN` entries in directory listing order.
    pub fn card_names(&self) -> MonitorResult<Vec<String>> {
        let listing_error = |source| MonitorError::DrmRoot {
            path: self.root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(listing_error)? {
            let entry = entry.map_err(listing_error)?;
            let file_name = entry.file_name();
            match file_name.to_str() {
                Some(name) if is_card_name(name) => names.push(name.to_string()),
                _ => {}
            }
        }
        Ok(names)
    }

    /// Reads every attribute of `<root>/<name>/device/` a snapshot needs.
    pub fn read_card(&self, name: &str) -> Result<CardAttributes, DeviceError> {
        let dir = self.root.join(name).join("device");

        let gpu_busy_percent: u32 = read_number(&dir, ATTR_GPU_BUSY)?;
        if gpu_busy_percent > 100 {
            return Err(DeviceError::BusyOutOfRange(gpu_busy_percent));
        }

        Ok(CardAttributes {
            name: name.to_string(),
            device_id: read_attribute(&dir, ATTR_DEVICE)?,
            class: read_attribute(&dir, ATTR_CLASS)?,
            gpu_busy_percent,
            vram_used: read_number(&dir, ATTR_VRAM_USED)?,
            vram_total: read_number(&dir, ATTR_VRAM_TOTAL)?,
            gpu_clock_mhz: read_dpm_clock(&dir, ATTR_SCLK),
            memory_clock_mhz: read_dpm_clock(&dir, ATTR_MCLK),
            driver: read_driver(&dir),
            pci_slot: read_pci_slot(&dir),
        })
    }

    /// Reads all cards, leaving out (and reporting) the ones that fail.
    pub fn enumerate(&self, observer: &dyn MonitorObserver) -> MonitorResult<Vec<CardAttributes>> {
        let names = self.card_names()?;
        tracing::debug!(root = %self.root.display(), cards = names.len(), "listed DRM cards");

        let mut cards = Vec::with_capacity(names.len());
        for name in names {
            match self.read_card(&name) {
                Ok(card) => cards.push(card),
                Err(e) => observer.device_skipped(&name, &e),
            }
        }
        Ok(cards)
    }
}

fn is_card_name(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn read_attribute(dir: &Path, attribute: &'static str) -> Result<String, DeviceError> {
    let path = dir.join(attribute);
    fs::read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|source| DeviceError::Read { path, source })
}

fn read_number<T>(dir: &Path, attribute: &'static str) -> Result<T, DeviceError>
where
    T: FromStr<Err = ParseIntError>,
{
    let value = read_attribute(dir, attribute)?;
    value
        .parse()
        .map_err(|source| DeviceError::InvalidNumber {
            attribute,
            value,
            source,
        })
}

// Active level of a DPM table such as
//   0: 500Mhz
//   1: 1800Mhz *
fn read_dpm_clock(dir: &Path, attribute: &'static str) -> Option<u32> {
    let table = fs::read_to_string(dir.join(attribute)).ok()?;
    table
        .lines()
        .find(|line| line.trim_end().ends_with('*'))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|clock| {
            clock
                .trim_end_matches("Mhz")
                .trim_end_matches("MHz")
                .parse()
                .ok()
        })
}

// `device/driver` links to the bound driver, e.g. `../../../bus/pci/drivers/amdgpu`
fn read_driver(dir: &Path) -> Option<String> {
    let target = fs::read_link(dir.join(ATTR_DRIVER)).ok()?;
    target.file_name()?.to_str().map(str::to_string)
}

fn read_pci_slot(dir: &Path) -> Option<String> {
    let uevent = fs::read_to_string(dir.join(ATTR_UEVENT)).ok()?;
    uevent
        .lines()
        .find_map(|line| line.strip_prefix("PCI_SLOT_NAME="))
        .map(|slot| slot.trim().to_string())
}

/// Maps a PCI class attribute to the lm-sensors chip name of the amdgpu hwmon
/// device: `0x030000` becomes `amdgpu-pci-0300`.
///
/// Only `0x` followed by six hex digits ending in `00` is accepted.
pub fn sensor_chip_name(class: &str) -> Result<String, DeviceError> {
    class
        .strip_prefix("0x")
        .filter(|code| code.len() == 6 && code.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|code| code.strip_suffix("00"))
        .map(|code| format!("{SENSOR_CHIP_PREFIX}{code}"))
        .ok_or_else(|| DeviceError::InvalidClassCode(class.to_string()))
}
