//! Telemetry store client

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::query::TelemetryQuery;
use crate::service::TelemetryStore;
use crate::transport::{HttpTransport, ServiceUrl};
use crate::types::{AggregatedTelemetry, DeviceTelemetryEnvelope, TelemetryData, TelemetryPoint};

/// HTTP client for the telemetry store.
///
/// Responses are decoded strictly: a field of the wrong type fails the call.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    transport: HttpTransport,
    base_url: ServiceUrl,
}

impl TelemetryClient {
    /// Create a client for the store at `base_url` with its own transport
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

    /// `POST /telemetry`, expecting `202 Accepted`
    #[instrument(skip(self, data), fields(device_id = data.device_id, metrics = data.metrics.len()))]
    pub async fn send_telemetry(&self, data: &TelemetryData) -> Result<()> {
        const OP: &str = "send_telemetry";
        let url = self.base_url.join("/telemetry")?;

        let response = self.transport.post_json(OP, url, data).await?;
        self.transport
            .expect_status(OP, response, StatusCode::ACCEPTED)
            .await
    }

    /// `GET /telemetry/devices/{id}` with a prepared query
    #[instrument(skip(self))]
    pub async fn query_device_telemetry(
        &self,
        device_id: u64,
        query: &TelemetryQuery,
    ) -> Result<Vec<TelemetryPoint>> {
        const OP: &str = "get_device_telemetry";
        let mut url = self
            .base_url
            .join(&format!("/telemetry/devices/{}", device_id))?;
        query.apply(&mut url);

        let response = self.transport.get(OP, url).await?;
        let envelope: DeviceTelemetryEnvelope = self
            .transport
            .read_json(OP, response, StatusCode::OK)
            .await?;

        debug!(points = envelope.metrics.len(), "Fetched device telemetry");
        Ok(envelope.metrics)
    }

    /// `GET /telemetry/devices/{id}` from raw caller input.
    ///
    /// `from` and `to` are forwarded only when they parse as RFC 3339; an
    /// unparsable bound is dropped rather than rejected.
    pub async fn get_device_telemetry(
        &self,
        device_id: u64,
        metric: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        aggregation: &str,
    ) -> Result<Vec<TelemetryPoint>> {
        <Self as TelemetryStore>::get_device_telemetry(
            self,
            device_id,
            metric,
            from,
            to,
            aggregation,
        )
        .await
    }

    /// `GET /telemetry/houses/{id}/aggregated?period=...`
    #[instrument(skip(self))]
    pub async fn get_aggregated_house_telemetry(
        &self,
        house_id: u64,
        period: &str,
    ) -> Result<AggregatedTelemetry> {
        const OP: &str = "get_aggregated_house_telemetry";
        let mut url = self
            .base_url
            .join(&format!("/telemetry/houses/{}/aggregated", house_id))?;
        url.query_pairs_mut().append_pair("period", period);

        let response = self.transport.get(OP, url).await?;
        self.transport
            .read_json(OP, response, StatusCode::OK)
            .await
    }
}

#[async_trait]
impl TelemetryStore for TelemetryClient {
    async fn send_telemetry(&self, data: &TelemetryData) -> Result<()> {
        TelemetryClient::send_telemetry(self, data).await
    }

    async fn query_device_telemetry(
        &self,
        device_id: u64,
        query: &TelemetryQuery,
    ) -> Result<Vec<TelemetryPoint>> {
        TelemetryClient::query_device_telemetry(self, device_id, query).await
    }

    async fn get_aggregated_house_telemetry(
        &self,
        house_id: u64,
        period: &str,
    ) -> Result<AggregatedTelemetry> {
        TelemetryClient::get_aggregated_house_telemetry(self, house_id, period).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_shares_transport() {
        let transport = HttpTransport::new().unwrap();
        let client = TelemetryClient::with_transport("http://localhost:5000/", transport);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url().as_str(), "http://localhost:5000");
    }
}
