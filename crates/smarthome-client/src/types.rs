//! Request and response types exchanged with the upstream services

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::coerce::{
    coerce_device_id, coerce_room_id, lenient_object, lenient_string, null_as_default, RawIdentifier,
};

/// Open-ended JSON object (device configuration, command parameters,
/// aggregate metrics)
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Device Types
// =============================================================================

/// A device as known to the device registry, with identifiers normalized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireDevice")]
pub struct Device {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub room_id: String,
    pub serial_number: String,
    pub status: String,
    pub configuration: JsonObject,
    pub last_seen: String,
    pub created_at: String,
}

/// Payload for creating a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration: JsonObject,
}

impl From<&Device> for DeviceCreate {
    fn from(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            device_type: device.device_type.clone(),
            room_id: device.room_id.clone(),
            serial_number: device.serial_number.clone(),
            configuration: device.configuration.clone(),
        }
    }
}

/// Device object exactly as the registry sends it
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireDevice {
    #[serde(default)]
    id: RawIdentifier,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    device_type: String,
    #[serde(default)]
    room_id: RawIdentifier,
    #[serde(default, deserialize_with = "lenient_string")]
    serial_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_object")]
    configuration: JsonObject,
    #[serde(default, deserialize_with = "lenient_string")]
    last_seen: String,
    #[serde(default, deserialize_with = "lenient_string")]
    created_at: String,
}

impl From<WireDevice> for Device {
    fn from(wire: WireDevice) -> Self {
        Self {
            id: coerce_device_id(&wire.id),
            name: wire.name,
            device_type: wire.device_type,
            room_id: coerce_room_id(&wire.room_id),
            serial_number: wire.serial_number,
            status: wire.status,
            configuration: wire.configuration,
            last_seen: wire.last_seen,
            created_at: wire.created_at,
        }
    }
}

/// One element of the device list; anything that is not an object still
/// yields a (default) device
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum DeviceEntry {
    Record(WireDevice),
    Malformed(IgnoredAny),
}

impl From<DeviceEntry> for Device {
    fn from(entry: DeviceEntry) -> Self {
        match entry {
            DeviceEntry::Record(wire) => wire.into(),
            DeviceEntry::Malformed(_) => WireDevice::default().into(),
        }
    }
}

/// `GET /api/v1/devices` response envelope.
///
/// The body must be a JSON object; a null or missing `devices` list reads as
/// empty, any other non-array value is an error.
pub(crate) struct DeviceListEnvelope {
    pub devices: Vec<DeviceEntry>,
}

impl<'de> Deserialize<'de> for DeviceListEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut body = JsonObject::deserialize(deserializer)?;
        let devices = match body.remove("devices") {
            Some(list) => null_as_default(list).map_err(de::Error::custom)?,
            None => Vec::new(),
        };
        Ok(Self { devices })
    }
}

/// Instruction sent to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    #[serde(default)]
    pub parameters: JsonObject,
}

/// Borrowed form of [`Command`] used for the outbound request body
#[derive(Serialize)]
pub(crate) struct CommandRef<'a> {
    pub command: &'a str,
    pub parameters: &'a JsonObject,
}

// =============================================================================
// Telemetry Types
// =============================================================================

/// A single named measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Telemetry batch reported by a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryData {
    pub device_id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

/// One sample of a device time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// `GET /telemetry/devices/{id}` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceTelemetryEnvelope {
    pub metrics: Vec<TelemetryPoint>,
}

/// House-level aggregate computed by the telemetry store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedTelemetry {
    pub house_id: u64,
    pub period: String,
    pub total_energy_consumption: f64,
    pub average_temperature: f64,
    pub device_count: u64,
    #[serde(default)]
    pub metrics: JsonObject,
}
