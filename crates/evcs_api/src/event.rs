use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use evcs_core::EventSnapshot;
use evcs_engine::{Engine, SubmitEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine_error_to_response;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event: EventSnapshot,
}

/// Submit a new event and run admission for it
pub async fn create_event(
    State(engine): State<Arc<Engine>>,
    Json(payload): Json<SubmitEvent>,
) -> impl IntoResponse {
    match engine.submit(payload) {
        Ok(event) => (StatusCode::OK, Json(EventResponse { event })).into_response(),
        Err(error) => engine_error_to_response(error),
    }
}

/// Get the current state of an event
pub async fn get_event(
    State(engine): State<Arc<Engine>>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse {
    match engine.event(event_id) {
        Ok(event) => (StatusCode::OK, Json(EventResponse { event })).into_response(),
        Err(error) => engine_error_to_response(error),
    }
}

/// Run admission again for a rejected or waiting event
pub async fn resubmit_event(
    State(engine): State<Arc<Engine>>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse {
    tracing::info!("Resubmitting event {}", event_id);
    match engine.resubmit(event_id) {
        Ok(event) => (StatusCode::OK, Json(EventResponse { event })).into_response(),
        Err(error) => engine_error_to_response(error),
    }
}
