//! Service traits for the upstream smart-home backends
//!
//! The API layer depends on these traits rather than on the concrete HTTP
//! clients, so any implementation (the clients in this crate, or an
//! in-process fake in tests) can sit behind the gateway.

use async_trait::async_trait;

use crate::error::Result;
use crate::query::TelemetryQuery;
use crate::types::{AggregatedTelemetry, Device, DeviceCreate, JsonObject, TelemetryData, TelemetryPoint};

/// Device registry operations exposed through the gateway
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// List all registered devices
    async fn list_devices(&self) -> Result<Vec<Device>>;

    /// Register a new device and return it as stored by the registry
    async fn create_device(&self, spec: &DeviceCreate) -> Result<Device>;

    /// Dispatch a command to a device without waiting for its execution
    async fn send_command(
        &self,
        device_id: u64,
        command: &str,
        parameters: &JsonObject,
    ) -> Result<()>;
}

/// Telemetry store operations exposed through the gateway
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Ingest a telemetry batch
    async fn send_telemetry(&self, data: &TelemetryData) -> Result<()>;

    /// Read one device's time series
    async fn query_device_telemetry(
        &self,
        device_id: u64,
        query: &TelemetryQuery,
    ) -> Result<Vec<TelemetryPoint>>;

    /// Read the house-level aggregate for `period`
    async fn get_aggregated_house_telemetry(
        &self,
        house_id: u64,
        period: &str,
    ) -> Result<AggregatedTelemetry>;

    /// Read one device's time series from raw caller input.
    ///
    /// `from` and `to` that are not valid RFC 3339 are left out of the
    /// query (see [`TelemetryQuery`]).
    async fn get_device_telemetry(
        &self,
        device_id: u64,
        metric: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        aggregation: &str,
    ) -> Result<Vec<TelemetryPoint>> {
        let query = TelemetryQuery::new(aggregation)
            .metric(metric)
            .from_rfc3339(from)
            .to_rfc3339(to);
        self.query_device_telemetry(device_id, &query).await
    }
}
