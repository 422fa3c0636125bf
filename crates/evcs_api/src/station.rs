use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use evcs_core::{Kind, StationConfig, StationStatus};
use evcs_engine::Engine;
use serde::{Deserialize, Serialize};

use crate::{engine_error_to_response, error_response};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitTimeResponse {
    pub kind: Kind,
    pub wait_ms: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeBatteriesResponse {
    pub kind: Kind,
    pub started: usize,
}

/// Get current station configuration
pub async fn get_station_config(State(engine): State<Arc<Engine>>) -> Json<StationConfig> {
    tracing::info!("Getting station configuration");
    Json(engine.config().clone())
}

/// Get station status: stock, pools and queues
pub async fn get_station_status(State(engine): State<Arc<Engine>>) -> Json<StationStatus> {
    tracing::info!("Getting station status");
    Json(engine.status())
}

/// Estimated wait for a new arrival of the given kind
pub async fn get_wait_time(
    State(engine): State<Arc<Engine>>,
    Path(kind): Path<String>,
) -> impl IntoResponse {
    let kind: Kind = match kind.parse() {
        Ok(kind) => kind,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, format!("{}", error)),
    };
    match engine.wait_time(kind) {
        Some(wait) => {
            let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
            (StatusCode::OK, Json(WaitTimeResponse { kind, wait_ms })).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Station has no {} units", kind)),
    }
}

/// Plain-text activity report
pub async fn get_station_report(State(engine): State<Arc<Engine>>) -> String {
    tracing::info!("Generating station report");
    engine.report()
}

/// Pull the next energy package from every source
pub async fn replenish(State(engine): State<Arc<Engine>>) -> Json<StationStatus> {
    tracing::info!("Replenishing station");
    Json(engine.replenish())
}

/// Put the pool batteries that are not full on chargers of the given kind
pub async fn charge_batteries(
    State(engine): State<Arc<Engine>>,
    Path(kind): Path<String>,
) -> impl IntoResponse {
    let kind: Kind = match kind.parse() {
        Ok(kind) => kind,
        Err(error) => return error_response(StatusCode::BAD_REQUEST, format!("{}", error)),
    };
    tracing::info!("Charging pool batteries on {} units", kind);
    match engine.charge_batteries(kind) {
        Ok(started) => {
            (StatusCode::OK, Json(ChargeBatteriesResponse { kind, started })).into_response()
        }
        Err(error) => engine_error_to_response(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::Request,
        routing::{get, post},
    };
    use evcs_core::{BatteryConfig, SourceConfig, SourceKind};
    use tower::util::ServiceExt;

    /// Create the application router with station endpoints
    pub fn create_app(engine: Engine) -> Router {
        Router::new()
            .route("/station/config", get(get_station_config))
            .route("/station/status", get(get_station_status))
            .route("/station/wait-time/{kind}", get(get_wait_time))
            .route("/station/replenish", post(replenish))
            .route("/station/charge-batteries/{kind}", post(charge_batteries))
            .with_state(Arc::new(engine))
    }

    fn test_station_config() -> StationConfig {
        let mut config = StationConfig::named("TEST_STATION");
        config.fast_chargers = 2;
        config.sources.push(SourceConfig {
            kind: SourceKind::Wind,
            initial_amount: 10.0,
            packages: vec![15.0],
        });
        config
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).method("POST").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let app = create_app(Engine::new(test_station_config()).unwrap());

        let response = app
            .oneshot(Request::builder().uri("/station/config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let config_response: StationConfig = serde_json::from_slice(&body).unwrap();
        assert_eq!(config_response.name, "TEST_STATION");
        assert_eq!(config_response.fast_chargers, 2);
    }

    #[tokio::test]
    async fn test_station_status_endpoint() {
        let app = create_app(Engine::new(test_station_config()).unwrap());

        let (status, body) = get_json(app, "/station/status").await;
        assert_eq!(status, StatusCode::OK);
        let status_response: StationStatus = serde_json::from_value(body).unwrap();
        assert_eq!(status_response.total_stock, 10.0);
        assert_eq!(status_response.lanes.len(), 5);
        assert!(status_response.auto_queue_handling);
    }

    #[tokio::test]
    async fn test_wait_time_endpoint() {
        let app = create_app(Engine::new(test_station_config()).unwrap());

        let (status, body) = get_json(app.clone(), "/station/wait-time/fast").await;
        assert_eq!(status, StatusCode::OK);
        let wait: WaitTimeResponse = serde_json::from_value(body).unwrap();
        assert_eq!(wait.kind, Kind::Fast);
        assert_eq!(wait.wait_ms, 0);

        let (status, _) = get_json(app.clone(), "/station/wait-time/slow").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_json(app, "/station/wait-time/turbo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("turbo"));
    }

    #[tokio::test]
    async fn test_replenish_endpoint() {
        let app = create_app(Engine::new(test_station_config()).unwrap());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/station/replenish")
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status_response: StationStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(status_response.total_stock, 25.0);
    }

    #[tokio::test]
    async fn test_charge_batteries_endpoint() {
        let mut config = test_station_config();
        config.batteries.push(BatteryConfig {
            capacity: 60.0,
            remaining: 55.0,
        });
        let app = create_app(Engine::new(config).unwrap());

        let (status, body) = post_json(app.clone(), "/station/charge-batteries/fast").await;
        assert_eq!(status, StatusCode::OK);
        let charged: ChargeBatteriesResponse = serde_json::from_value(body).unwrap();
        assert_eq!(charged.kind, Kind::Fast);
        assert_eq!(charged.started, 1);

        let (status, _) = post_json(app.clone(), "/station/charge-batteries/exchange").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(app, "/station/charge-batteries/turbo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
