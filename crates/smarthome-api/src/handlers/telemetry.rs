//! Telemetry handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smarthome_client::{AggregatedTelemetry, Metric, TelemetryData, TelemetryPoint};

use super::{parse_id, MessageResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Aggregation used when the caller does not ask for one
pub const DEFAULT_AGGREGATION: &str = "raw";
/// Period used when the caller does not ask for one
pub const DEFAULT_PERIOD: &str = "today";
/// Periods the telemetry store can aggregate over
pub const VALID_PERIODS: [&str; 4] = ["today", "yesterday", "week", "month"];

/// Unix timestamp of `0001-01-01T00:00:00Z`, the "unset" time some
/// producers send instead of omitting the field
const ZERO_TIME_UNIX: i64 = -62_135_596_800;

/// Inbound telemetry batch; the timestamp is optional at the edge
#[derive(Debug, Deserialize)]
pub struct TelemetryRequest {
    #[serde(default)]
    pub device_id: u64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl TelemetryRequest {
    /// Fill in `now` for a missing or zero timestamp
    pub fn into_data(self, now: DateTime<Utc>) -> TelemetryData {
        let timestamp = match self.timestamp {
            Some(ts) if !is_zero_time(&ts) => ts,
            _ => now,
        };
        TelemetryData {
            device_id: self.device_id,
            timestamp,
            metrics: self.metrics,
        }
    }
}

fn is_zero_time(ts: &DateTime<Utc>) -> bool {
    ts.timestamp() == ZERO_TIME_UNIX && ts.timestamp_subsec_nanos() == 0
}

#[derive(Debug, Deserialize)]
pub struct DeviceTelemetryParams {
    pub metric: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub aggregation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeviceTelemetryResponse {
    pub device_id: u64,
    pub metrics: Vec<TelemetryPoint>,
}

#[derive(Debug, Deserialize)]
pub struct AggregatedParams {
    pub period: Option<String>,
}

/// POST /api/v1/telemetry
/// Ingest a telemetry batch
pub async fn send_telemetry(
    State(state): State<AppState>,
    body: Result<Json<TelemetryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = body?;
    let data = request.into_data(Utc::now());

    state.telemetry().send_telemetry(&data).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Telemetry data accepted",
        }),
    ))
}

/// GET /api/v1/telemetry/devices/{id}
/// Read one device's time series
///
/// `from` and `to` are passed through unparsed; bounds that are not valid
/// RFC 3339 are dropped by the client instead of failing the request.
pub async fn get_device_telemetry(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(params): Query<DeviceTelemetryParams>,
) -> Result<Json<DeviceTelemetryResponse>, ApiError> {
    let device_id = parse_id(&device_id, "device")?;
    let aggregation = params
        .aggregation
        .as_deref()
        .unwrap_or(DEFAULT_AGGREGATION);

    let metrics = state
        .telemetry()
        .get_device_telemetry(
            device_id,
            params.metric.as_deref(),
            params.from.as_deref(),
            params.to.as_deref(),
            aggregation,
        )
        .await?;

    Ok(Json(DeviceTelemetryResponse { device_id, metrics }))
}

/// GET /api/v1/telemetry/houses/{id}/aggregated
/// Read the house-level aggregate for a period
pub async fn get_aggregated_house_telemetry(
    State(state): State<AppState>,
    Path(house_id): Path<String>,
    Query(params): Query<AggregatedParams>,
) -> Result<Json<AggregatedTelemetry>, ApiError> {
    let house_id = parse_id(&house_id, "house")?;
    let period = params.period.as_deref().unwrap_or(DEFAULT_PERIOD);

    if !VALID_PERIODS.contains(&period) {
        return Err(ApiError::BadRequest(format!(
            "Invalid period. Must be one of: {}",
            VALID_PERIODS.join(", ")
        )));
    }

    let aggregated = state
        .telemetry()
        .get_aggregated_house_telemetry(house_id, period)
        .await?;

    Ok(Json(aggregated))
}
