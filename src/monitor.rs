use crate::config::MonitorConfig;
use crate::data::{DeviceInfo, DeviceInfoList, GpuStats, SensorChip, SensorReport};
use crate::error::{DeviceError, MonitorResult};
use crate::observer::{MonitorObserver, TracingObserver};
use crate::sensors::{parse_sensor_report, SensorSource, SensorsCommand};
use crate::sysfs::{sensor_chip_name, CardAttributes, DrmEnumerator};
use std::sync::Arc;

pub trait GpuMonitor: Send + Sync {
    /// Runs one poll cycle.
    fn device_info_list(&self) -> MonitorResult<DeviceInfoList>;
}

/// Correlates DRM sysfs counters with the lm-sensors report.
pub struct AmdGpuMonitor {
    enumerator: DrmEnumerator,
    sensors: Box<dyn SensorSource>,
    observer: Arc<dyn MonitorObserver>,
}

impl AmdGpuMonitor {
    pub fn new(
        enumerator: DrmEnumerator,
        sensors: Box<dyn SensorSource>,
        observer: Arc<dyn MonitorObserver>,
    ) -> Self {
        Self {
            enumerator,
            sensors,
            observer,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            DrmEnumerator::from_config(config),
            Box::new(SensorsCommand::from_config(config)),
            Arc::new(TracingObserver),
        )
    }

    fn poll(&self) -> MonitorResult<DeviceInfoList> {
        let raw = self.sensors.read()?;
        let report = parse_sensor_report(&raw)?;
        tracing::debug!(chips = report.len(), "parsed sensors report");

        let cards = self.enumerator.enumerate(self.observer.as_ref())?;
        Ok(assemble(&report, cards, self.observer.as_ref()))
    }
}

impl GpuMonitor for AmdGpuMonitor {
    fn device_info_list(&self) -> MonitorResult<DeviceInfoList> {
        self.poll().inspect_err(|e| self.observer.cycle_failed(e))
    }
}

/// Pairs each card with its sensor chip, keeping enumeration order. Cards
/// without a usable chip are reported and left out.
pub fn assemble(
    report: &SensorReport,
    cards: Vec<CardAttributes>,
    observer: &dyn MonitorObserver,
) -> DeviceInfoList {
    let mut items = Vec::with_capacity(cards.len());
    for card in cards {
        match device_info(report, card) {
            Ok(info) => items.push(info),
            Err((name, e)) => observer.device_skipped(&name, &e),
        }
    }
    DeviceInfoList { items }
}

fn device_info(
    report: &SensorReport,
    card: CardAttributes,
) -> Result<DeviceInfo, (String, DeviceError)> {
    let sensor_chip = match sensor_chip_name(&card.class) {
        Ok(chip) => chip,
        Err(e) => return Err((card.name, e)),
    };
    let Some(chip) = report.get(&sensor_chip) else {
        return Err((card.name, DeviceError::MissingSensorChip(sensor_chip)));
    };

    Ok(DeviceInfo {
        stats: merge_stats(&card, chip),
        name: card.name,
        device_id: card.device_id,
        class: card.class,
        sensor_chip,
        driver: card.driver,
        pci_slot: card.pci_slot,
    })
}

fn merge_stats(card: &CardAttributes, chip: &SensorChip) -> GpuStats {
    GpuStats {
        gpu_usage: card.gpu_busy_percent,
        vram_used: card.vram_used,
        vram_total: card.vram_total,
        temp_edge: chip.temp_edge,
        temp_junction: chip.temp_junction,
        temp_mem: chip.temp_mem,
        gpu_clock_mhz: card.gpu_clock_mhz,
        memory_clock_mhz: card.memory_clock_mhz,
        fan_rpm: chip.fan_rpm,
        power_watts: chip.power_average,
    }
}

pub fn create_monitor(config: &MonitorConfig) -> Box<dyn GpuMonitor> {
    tracing::info!(
        drm_root = %config.drm_root.display(),
        sensors = %config.sensors_program,
        "using amdgpu sysfs + lm-sensors monitor"
    );
    Box::new(AmdGpuMonitor::from_config(config))
}
