//! Application state for the gateway API

use std::sync::Arc;

use smarthome_client::{DeviceRegistry, TelemetryStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    devices: Arc<dyn DeviceRegistry>,
    telemetry: Arc<dyn TelemetryStore>,
}

impl AppState {
    /// Create a new AppState from the two upstream services
    pub fn new(devices: Arc<dyn DeviceRegistry>, telemetry: Arc<dyn TelemetryStore>) -> Self {
        Self { devices, telemetry }
    }

    /// Device registry
    pub fn devices(&self) -> &dyn DeviceRegistry {
        self.devices.as_ref()
    }

    /// Telemetry store
    pub fn telemetry(&self) -> &dyn TelemetryStore {
        self.telemetry.as_ref()
    }
}
