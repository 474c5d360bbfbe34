//! Full poll cycles against a fake DRM tree and canned sensors output.
//!
//! These tests don't need an AMD GPU or lm-sensors installed.

use radeontop::{
    AmdGpuMonitor, DeviceError, DrmEnumerator, GpuMonitor, MonitorError, MonitorObserver,
    MonitorResult, SensorSource,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const SENSORS_JSON: &str = include_str!("testdata/sensors.json");

// ============================================================================
// Fixtures
// ============================================================================

struct CannedSensors(Vec<u8>);

impl SensorSource for CannedSensors {
    fn read(&self) -> MonitorResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct RecordingObserver {
    skipped: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl MonitorObserver for RecordingObserver {
    fn device_skipped(&self, device: &str, _error: &DeviceError) {
        self.skipped.lock().unwrap().push(device.to_string());
    }

    fn cycle_failed(&self, error: &MonitorError) {
        self.failures.lock().unwrap().push(error.to_string());
    }
}

fn write_card(root: &Path, name: &str, class: &str, busy: &str) {
    let dir = root.join(name).join("device");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("device"), "0x73bf\n").unwrap();
    fs::write(dir.join("class"), format!("{class}\n")).unwrap();
    fs::write(dir.join("gpu_busy_percent"), format!("{busy}\n")).unwrap();
    fs::write(dir.join("mem_info_vram_used"), "1048576\n").unwrap();
    fs::write(dir.join("mem_info_vram_total"), "8589934592\n").unwrap();
}

fn monitor(
    root: &Path,
    sensors: impl Into<Vec<u8>>,
) -> (AmdGpuMonitor, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let monitor = AmdGpuMonitor::new(
        DrmEnumerator::new(root),
        Box::new(CannedSensors(sensors.into())),
        observer.clone(),
    );
    (monitor, observer)
}

// ============================================================================
// Poll cycle
// ============================================================================

#[test]
fn single_card_snapshot() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");

    let (monitor, observer) = monitor(root.path(), SENSORS_JSON);
    let list = monitor.device_info_list().unwrap();

    assert_eq!(list.len(), 1);
    let card0 = &list.items[0];
    assert_eq!(card0.name, "card0");
    assert_eq!(card0.device_id, "0x73bf");
    assert_eq!(card0.class, "0x030000");
    assert_eq!(card0.sensor_chip, "amdgpu-pci-0300");
    assert_eq!(card0.stats.gpu_usage, 45);
    assert_eq!(card0.stats.vram_used, 1048576);
    assert_eq!(card0.stats.vram_total, 8589934592);
    assert_eq!(card0.stats.temp_edge, 33.0);
    assert_eq!(card0.stats.temp_junction, 38.0);
    assert_eq!(card0.stats.temp_mem, 42.0);
    assert_eq!(card0.stats.power_watts, 9.0);

    assert!(observer.skipped.lock().unwrap().is_empty());
    assert!(observer.failures.lock().unwrap().is_empty());
}

#[test]
fn card_without_sensor_chip_is_omitted() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");
    write_card(root.path(), "card1", "0x090000", "12");

    let (monitor, observer) = monitor(root.path(), SENSORS_JSON);
    let list = monitor.device_info_list().unwrap();

    assert_eq!(list.names(), vec!["card0"]);
    assert_eq!(*observer.skipped.lock().unwrap(), vec!["card1"]);
}

#[test]
fn follows_discovery_order() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");
    write_card(root.path(), "card1", "0x090000", "12");
    let sensors = r#"{
        "amdgpu-pci-0300": {"edge": {"temp1_input": 33.0}},
        "amdgpu-pci-0900": {"edge": {"temp1_input": 51.0}}
    }"#;

    let (monitor, _) = monitor(root.path(), sensors);
    let list = monitor.device_info_list().unwrap();

    let discovered = DrmEnumerator::new(root.path()).card_names().unwrap();
    assert_eq!(list.names(), discovered.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(list.len(), 2);
}

#[test]
fn unreadable_card_does_not_blank_others() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");
    write_card(root.path(), "card1", "0x030000", "not-a-number");
    fs::create_dir_all(root.path().join("renderD128")).unwrap();

    let (monitor, observer) = monitor(root.path(), SENSORS_JSON);
    let list = monitor.device_info_list().unwrap();

    assert_eq!(list.names(), vec!["card0"]);
    assert_eq!(*observer.skipped.lock().unwrap(), vec!["card1"]);
}

#[test]
fn repeated_polls_are_independent() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");

    let (monitor, _) = monitor(root.path(), SENSORS_JSON);
    let first = monitor.device_info_list().unwrap();

    write_card(root.path(), "card0", "0x030000", "80");
    let second = monitor.device_info_list().unwrap();

    assert_eq!(first.items[0].stats.gpu_usage, 45);
    assert_eq!(second.items[0].stats.gpu_usage, 80);
}

// ============================================================================
// Cycle failures
// ============================================================================

#[test]
fn malformed_sensors_output_fails_cycle() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");

    let (monitor, observer) = monitor(root.path(), "[]");
    let err = monitor.device_info_list().unwrap_err();

    assert!(matches!(err, MonitorError::SensorParse(_)));
    assert_eq!(observer.failures.lock().unwrap().len(), 1);
}

#[test]
fn missing_drm_root_fails_cycle() {
    let root = TempDir::new().unwrap();

    let (monitor, observer) = monitor(&root.path().join("drm"), SENSORS_JSON);
    let err = monitor.device_info_list().unwrap_err();

    assert!(matches!(err, MonitorError::DrmRoot { .. }));
    assert_eq!(observer.failures.lock().unwrap().len(), 1);
}

#[test]
fn missing_sensors_program_fails_cycle() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");

    let observer = Arc::new(RecordingObserver::default());
    let monitor = AmdGpuMonitor::new(
        DrmEnumerator::new(root.path()),
        Box::new(radeontop::SensorsCommand::new(
            "/nonexistent/sensors",
            vec!["-j".to_string()],
        )),
        observer.clone(),
    );

    let err = monitor.device_info_list().unwrap_err();
    assert!(matches!(err, MonitorError::SensorSpawn { .. }));
    assert_eq!(observer.failures.lock().unwrap().len(), 1);
}

#[test]
fn failing_sensors_program_fails_cycle() {
    let root = TempDir::new().unwrap();
    write_card(root.path(), "card0", "0x030000", "45");

    let observer = Arc::new(RecordingObserver::default());
    let monitor = AmdGpuMonitor::new(
        DrmEnumerator::new(root.path()),
        Box::new(radeontop::SensorsCommand::new(
            "sh",
            vec!["-c".to_string(), "echo oops >&2; exit 3".to_string()],
        )),
        observer.clone(),
    );

    let err = monitor.device_info_list().unwrap_err();
    assert!(matches!(err, MonitorError::SensorExit { ref stderr, .. } if stderr == "oops"));

    let failures = observer.failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("oops"));
    assert!(observer.skipped.lock().unwrap().is_empty());
}

#[test]
fn no_cards_is_empty_list() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("renderD128")).unwrap();

    let (monitor, _) = monitor(root.path(), SENSORS_JSON);
    assert!(monitor.device_info_list().unwrap().is_empty());
}
