//! Device registry client

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::service::DeviceRegistry;
use crate::transport::{HttpTransport, ServiceUrl};
use crate::types::{CommandRef, Device, DeviceCreate, DeviceListEnvelope, JsonObject, WireDevice};

/// HTTP client for the device registry.
///
/// Identifiers in registry responses are normalized as described in
/// [`crate::coerce`]; every other decoding problem is a hard error.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    transport: HttpTransport,
    base_url: ServiceUrl,
}

impl DeviceClient {
    /// Create a client for the registry at `base_url` with its own transport
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_transport(base_url, HttpTransport::new()?)
    }

    /// Create a client that shares an existing transport
    pub fn with_transport(base_url: &str, transport: HttpTransport) -> Result<Self> {
        Ok(Self {
            transport,
            base_url: ServiceUrl::parse(base_url)?,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &ServiceUrl {
        &self.base_url
    }

    /// `GET /api/v1/devices`
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        const OP: &str = "list_devices";
        let url = self.base_url.join("/api/v1/devices")?;

        let response = self.transport.get(OP, url).await?;
        let envelope: DeviceListEnvelope = self
            .transport
            .read_json(OP, response, StatusCode::OK)
            .await?;

        let devices: Vec<Device> = envelope.devices.into_iter().map(Device::from).collect();
        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// `POST /api/v1/devices`, expecting `201 Created`
    #[instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn create_device(&self, spec: &DeviceCreate) -> Result<Device> {
        const OP: &str = "create_device";
        let url = self.base_url.join("/api/v1/devices")?;

        let response = self.transport.post_json(OP, url, spec).await?;
        let wire: WireDevice = self
            .transport
            .read_json(OP, response, StatusCode::CREATED)
            .await?;

        let device = Device::from(wire);
        debug!(id = device.id, "Created device");
        Ok(device)
    }

    /// `POST /api/v1/devices/{id}/commands`, expecting `202 Accepted`.
    ///
    /// The response body is discarded; execution is not confirmed.
    #[instrument(skip(self, parameters))]
    pub async fn send_command(
        &self,
        device_id: u64,
        command: &str,
        parameters: &JsonObject,
    ) -> Result<()> {
        const OP: &str = "send_command";
        let url = self
            .base_url
            .join(&format!("/api/v1/devices/{}/commands", device_id))?;

        let body = CommandRef {
            command,
            parameters,
        };
        let response = self.transport.post_json(OP, url, &body).await?;
        self.transport
            .expect_status(OP, response, StatusCode::ACCEPTED)
            .await
    }
}

#[async_trait]
impl DeviceRegistry for DeviceClient {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        DeviceClient::list_devices(self).await
    }

    async fn create_device(&self, spec: &DeviceCreate) -> Result<Device> {
        DeviceClient::create_device(self, spec).await
    }

    async fn send_command(
        &self,
        device_id: u64,
        command: &str,
        parameters: &JsonObject,
    ) -> Result<()> {
        DeviceClient::send_command(self, device_id, command, parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn test_client_creation() {
        let client = DeviceClient::new("http://localhost:8000");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url().as_str(), "http://localhost:8000");
    }

    #[test]
    fn test_invalid_url() {
        let client = DeviceClient::new("not a url");
        assert!(matches!(client, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_command_body_shape() {
        let mut parameters = JsonObject::new();
        parameters.insert("level".to_string(), serde_json::json!(40));
        let body = CommandRef {
            command: "dim",
            parameters: &parameters,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"command": "dim", "parameters": {"level": 40}})
        );
    }
}
