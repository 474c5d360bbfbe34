use crate::error::{DeviceError, MonitorError};

/// Receives the failures of a poll cycle that are not returned to the caller
/// as a value: devices left out of the list, and the error that ended a cycle.
pub trait MonitorObserver: Send + Sync {
    fn device_skipped(&self, device: &str, error: &DeviceError);

    fn cycle_failed(&self, error: &MonitorError);
}

/// Forwards every event to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl MonitorObserver for TracingObserver {
    fn device_skipped(&self, device: &str, error: &DeviceError) {
        tracing::warn!(device, %error, "skipping device");
    }

    fn cycle_failed(&self, error: &MonitorError) {
        tracing::error!(%error, "poll cycle failed");
    }
}
