//! Device handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use smarthome_client::{Command, Device, DeviceCreate};

use super::{parse_id, MessageResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/devices
/// List all devices known to the registry
pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<Device>>, ApiError> {
    let devices = state.devices().list_devices().await?;
    Ok(Json(devices))
}

/// POST /api/v1/devices
/// Register a new device
pub async fn create_device(
    State(state): State<AppState>,
    body: Result<Json<DeviceCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let Json(spec) = body?;
    let device = state.devices().create_device(&spec).await?;

    tracing::info!(device_id = device.id, name = %device.name, "Device created");
    Ok((StatusCode::CREATED, Json(device)))
}

/// POST /api/v1/devices/{id}/commands
/// Forward a command to a device
pub async fn send_command(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    body: Result<Json<Command>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let device_id = parse_id(&device_id, "device")?;
    let Json(command) = body?;

    if command.command.is_empty() {
        return Err(ApiError::BadRequest("command must not be empty".to_string()));
    }

    state
        .devices()
        .send_command(device_id, &command.command, &command.parameters)
        .await?;

    tracing::debug!(device_id, command = %command.command, "Command forwarded");
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Command sent successfully",
        }),
    ))
}
