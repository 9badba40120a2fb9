//! Integration tests for the telemetry store client

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use smarthome_client::testing::{RequestLog, TestServer};
use smarthome_client::{
    ClientError, Metric, TelemetryClient, TelemetryData, TelemetryQuery, TelemetryStore,
};

async fn start_store(router: Router) -> (TestServer, RequestLog, TelemetryClient) {
    let log = RequestLog::new();
    let server = TestServer::start(log.layer(router)).await.unwrap();
    let client = TelemetryClient::new(&server.base_url()).unwrap();
    (server, log, client)
}

fn device_series() -> Router {
    Router::new().route(
        "/telemetry/devices/{id}",
        get(|| async {
            Json(json!({
                "device_id": 5,
                "metrics": [
                    {"timestamp": "2024-05-01T10:00:00Z", "value": 20.5, "unit": "C"},
                    {"timestamp": "2024-05-01T11:00:00Z", "value": 21.0}
                ]
            }))
        }),
    )
}

// =============================================================================
// send_telemetry
// =============================================================================

#[tokio::test]
async fn test_send_telemetry_accepted() {
    let router = Router::new().route("/telemetry", post(|| async { StatusCode::ACCEPTED }));
    let (_server, log, client) = start_store(router).await;

    let data = TelemetryData {
        device_id: 5,
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        metrics: vec![
            Metric {
                name: "temperature".to_string(),
                value: 21.5,
                unit: Some("C".to_string()),
            },
            Metric {
                name: "humidity".to_string(),
                value: 40.0,
                unit: None,
            },
        ],
    };
    client.send_telemetry(&data).await.unwrap();

    let request = log.last().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/telemetry");
    assert_eq!(
        request.json(),
        json!({
            "device_id": 5,
            "timestamp": "2024-05-01T12:00:00Z",
            "metrics": [
                {"name": "temperature", "value": 21.5, "unit": "C"},
                {"name": "humidity", "value": 40.0}
            ]
        })
    );
}

#[tokio::test]
async fn test_send_telemetry_requires_accepted() {
    let router = Router::new().route("/telemetry", post(|| async { StatusCode::OK }));
    let (_server, _log, client) = start_store(router).await;

    let data = TelemetryData {
        device_id: 1,
        timestamp: Utc::now(),
        metrics: vec![],
    };
    let err = client.send_telemetry(&data).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::UpstreamStatus {
            operation: "send_telemetry",
            status: 200,
            ..
        }
    ));
}

// =============================================================================
// get_device_telemetry
// =============================================================================

#[tokio::test]
async fn test_device_telemetry_decodes_points() {
    let (_server, log, client) = start_store(device_series()).await;

    let points = client
        .get_device_telemetry(5, Some("temperature"), None, None, "raw")
        .await
        .unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].value, 20.5);
    assert_eq!(points[0].unit.as_deref(), Some("C"));
    assert_eq!(
        points[1].timestamp,
        Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
    );
    assert_eq!(points[1].unit, None);

    let request = log.last().unwrap();
    assert_eq!(request.path, "/telemetry/devices/5");
    assert_eq!(
        request.query.as_deref(),
        Some("metric=temperature&aggregation=raw")
    );
}

#[tokio::test]
async fn test_device_telemetry_omits_unparsable_bound() {
    let (_server, log, client) = start_store(device_series()).await;

    client
        .get_device_telemetry(
            5,
            None,
            Some("not-a-timestamp"),
            Some("2024-05-02T00:00:00Z"),
            "hourly",
        )
        .await
        .unwrap();

    let request = log.last().unwrap();
    assert_eq!(request.query_param("from"), None);
    assert_eq!(
        request.query_param("to").as_deref(),
        Some("2024-05-02T00:00:00Z")
    );
    assert_eq!(request.query_param("aggregation").as_deref(), Some("hourly"));
    assert_eq!(request.query_param("metric"), None);
}

#[tokio::test]
async fn test_device_telemetry_via_trait_object() {
    let (_server, log, client) = start_store(device_series()).await;
    let store: &dyn TelemetryStore = &client;

    let query = TelemetryQuery::new("daily").from_rfc3339(Some("2024-05-01T00:00:00+02:00"));
    let points = store.query_device_telemetry(5, &query).await.unwrap();
    assert_eq!(points.len(), 2);

    let request = log.last().unwrap();
    assert_eq!(
        request.query_param("from").as_deref(),
        Some("2024-05-01T00:00:00+02:00")
    );
}

#[tokio::test]
async fn test_device_telemetry_strict_decoding() {
    let router = Router::new().route(
        "/telemetry/devices/{id}",
        get(|| async {
            Json(json!({
                "device_id": 5,
                "metrics": [{"timestamp": "2024-05-01T10:00:00Z", "value": "20.5"}]
            }))
        }),
    );
    let (_server, _log, client) = start_store(router).await;

    let err = client
        .get_device_telemetry(5, None, None, None, "raw")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Decode {
            operation: "get_device_telemetry",
            ..
        }
    ));
}

#[tokio::test]
async fn test_device_telemetry_unexpected_status() {
    let router = Router::new().route(
        "/telemetry/devices/{id}",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let (_server, _log, client) = start_store(router).await;

    let err = client
        .get_device_telemetry(5, None, None, None, "raw")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

// =============================================================================
// get_aggregated_house_telemetry
// =============================================================================

#[tokio::test]
async fn test_aggregated_house_telemetry_verbatim() {
    let body = json!({
        "house_id": 7,
        "period": "week",
        "total_energy_consumption": 12.5,
        "average_temperature": 21.0,
        "device_count": 3,
        "metrics": {}
    });
    let response = body.clone();
    let router = Router::new().route(
        "/telemetry/houses/{id}/aggregated",
        get(move || {
            let response = response.clone();
            async move { Json(response) }
        }),
    );
    let (_server, log, client) = start_store(router).await;

    let aggregated = client.get_aggregated_house_telemetry(7, "week").await.unwrap();

    assert_eq!(aggregated.house_id, 7);
    assert_eq!(aggregated.device_count, 3);
    assert_eq!(serde_json::to_value(&aggregated).unwrap(), body);

    let request = log.last().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/telemetry/houses/7/aggregated");
    assert_eq!(request.query.as_deref(), Some("period=week"));
}

#[tokio::test]
async fn test_aggregated_house_telemetry_keeps_extra_metrics() {
    let router = Router::new().route(
        "/telemetry/houses/{id}/aggregated",
        get(|| async {
            Json(json!({
                "house_id": 2,
                "period": "today",
                "total_energy_consumption": 3.25,
                "average_temperature": 19.5,
                "device_count": 4,
                "metrics": {"peak_power": {"value": 2.2, "unit": "kW"}, "alerts": [1, 2]}
            }))
        }),
    );
    let (_server, _log, client) = start_store(router).await;

    let aggregated = client
        .get_aggregated_house_telemetry(2, "today")
        .await
        .unwrap();
    assert_eq!(aggregated.metrics["peak_power"]["unit"], "kW");
    assert_eq!(aggregated.metrics["alerts"], json!([1, 2]));
}

#[tokio::test]
async fn test_aggregated_house_telemetry_not_found() {
    let router = Router::new().route(
        "/telemetry/houses/{id}/aggregated",
        get(|| async { StatusCode::NOT_FOUND }),
    );
    let (_server, _log, client) = start_store(router).await;

    let err = client
        .get_aggregated_house_telemetry(404, "month")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::UpstreamStatus {
            operation: "get_aggregated_house_telemetry",
            status: 404,
            ..
        }
    ));
}
