//! Smart-home service clients
//!
//! Typed HTTP clients for the two backends behind the smart-home gateway:
//! the device registry and the telemetry store.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use smarthome_client::{DeviceClient, HttpTransport, TelemetryClient, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), smarthome_client::ClientError> {
//!     // One transport, one connection pool, one timeout policy for both
//!     let transport = HttpTransport::with_config(TransportConfig::with_timeout(
//!         Duration::from_secs(10),
//!     ))?;
//!
//!     let devices = DeviceClient::with_transport("http://localhost:8000", transport.clone())?;
//!     let telemetry = TelemetryClient::with_transport("http://localhost:5000", transport)?;
//!
//!     for device in devices.list_devices().await? {
//!         let points = telemetry
//!             .get_device_telemetry(device.id, Some("temperature"), None, None, "raw")
//!             .await?;
//!         println!("{}: {} samples", device.name, points.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Tolerant decoding
//!
//! Device identifiers may arrive as JSON numbers or strings; see [`coerce`]
//! for the exact fallback rules. Telemetry responses are decoded strictly.
//!
//! # Testing
//!
//! The `testing` module provides a throwaway HTTP server and a request log
//! for standing in for either backend:
//!
//! ```rust,ignore
//! use smarthome_client::testing::{RequestLog, TestServer};
//!
//! let log = RequestLog::new();
//! let server = TestServer::start(log.layer(stub_router)).await?;
//! let client = DeviceClient::new(&server.base_url())?;
//! ```

pub mod coerce;
mod device;
mod error;
mod query;
mod service;
mod telemetry;
pub mod testing;
mod transport;
mod types;

pub use device::DeviceClient;
pub use error::{ClientError, Result};
pub use query::TelemetryQuery;
pub use service::{DeviceRegistry, TelemetryStore};
pub use telemetry::TelemetryClient;
pub use transport::{
    HttpTransport, ServiceUrl, TransportConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT,
};
pub use types::*;
