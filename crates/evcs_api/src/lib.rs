//! EVCS API Library
//!
//! This library provides the HTTP API for the EV charging station scheduler.

mod event;
mod station;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use evcs_core::StationError;
use evcs_engine::{Engine, EngineError};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

pub(crate) fn engine_error_to_response(error: EngineError) -> axum::response::Response {
    let status = match &error {
        EngineError::EventNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        EngineError::Station(StationError::UnitNotFound { .. }) => StatusCode::NOT_FOUND,
        EngineError::Station(_) => StatusCode::CONFLICT,
    };
    error_response(status, error.to_string())
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Create the application router with all endpoints
pub fn create_app(engine: Engine) -> Router {
    let shared_state = Arc::new(engine);
    Router::new()
        .route("/health", get(health_check))
        .route("/station/config", get(station::get_station_config))
        .route("/station/status", get(station::get_station_status))
        .route("/station/wait-time/{kind}", get(station::get_wait_time))
        .route("/station/report", get(station::get_station_report))
        .route("/station/replenish", post(station::replenish))
        .route("/station/charge-batteries/{kind}", post(station::charge_batteries))
        .route("/events", post(event::create_event))
        .route("/events/{event_id}", get(event::get_event))
        .route("/events/{event_id}/resubmit", post(event::resubmit_event))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use evcs_core::{Condition, EventSnapshot, Kind, SourceConfig, SourceKind, StationConfig};
    use evcs_engine::{BatteryRequest, SubmitEvent, VehicleRequest};
    use tower::util::ServiceExt;

    fn test_engine() -> Engine {
        let mut config = StationConfig::named("TEST_STATION");
        config.fast_chargers = 1;
        config.sources.push(SourceConfig {
            kind: SourceKind::Solar,
            initial_amount: 100.0,
            packages: vec![],
        });
        Engine::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_app(test_engine());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_integration_submit_then_report() {
        let app = create_app(test_engine());

        let submit = SubmitEvent {
            kind: Kind::Fast,
            amount: Some(5.0),
            budget: None,
            max_wait_secs: 0,
            parking_secs: None,
            vehicle: VehicleRequest {
                brand: "Tesla".into(),
                driver: "Maria".into(),
                battery: BatteryRequest {
                    capacity: 80.0,
                    remaining: 10.0,
                    active: true,
                },
            },
        };
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/events")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(&submit).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: event::EventResponse = serde_json::from_slice(&body).unwrap();
        let snapshot: EventSnapshot = created.event;
        assert_eq!(snapshot.condition, Condition::Charging);

        let response = app
            .oneshot(Request::builder().uri("/station/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report = String::from_utf8(body.to_vec()).unwrap();
        assert!(report.contains(&format!("Id: {}", snapshot.id)));
        assert!(report.contains("Remaining energy: 95"));
    }
}
