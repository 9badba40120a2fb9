//! smarthome-api - REST API layer of the smart-home gateway
//!
//! This crate provides the HTTP routes the frontends talk to. Handlers are
//! thin: they validate input and delegate to a `DeviceRegistry` and a
//! `TelemetryStore`, which in production are the HTTP clients from
//! `smarthome-client`.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use smarthome_api::{create_router, AppState};
//! use smarthome_client::{DeviceClient, HttpTransport, TelemetryClient};
//!
//! let transport = HttpTransport::new()?;
//! let devices = DeviceClient::with_transport("http://localhost:8000", transport.clone())?;
//! let telemetry = TelemetryClient::with_transport("http://localhost:5000", transport)?;
//! let router = create_router(AppState::new(Arc::new(devices), Arc::new(telemetry)));
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Device routes
        .route(
            "/api/v1/devices",
            get(handlers::devices::list_devices).post(handlers::devices::create_device),
        )
        .route(
            "/api/v1/devices/{id}/commands",
            post(handlers::devices::send_command),
        )
        // Telemetry routes
        .route("/api/v1/telemetry", post(handlers::telemetry::send_telemetry))
        .route(
            "/api/v1/telemetry/devices/{id}",
            get(handlers::telemetry::get_device_telemetry),
        )
        .route(
            "/api/v1/telemetry/houses/{id}/aggregated",
            get(handlers::telemetry::get_aggregated_house_telemetry),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
