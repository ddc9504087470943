//! HTTP shell over the risk engine
//!
//! Two routes:
//! - `GET /health`: liveness plus the fingerprint of the loaded bundle
//! - `POST /predict`: one observation in, one [`RiskAssessment`] out
//!
//! Client-input errors come back as 422 with a structured report naming the
//! offending field. Anything else is a 500.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clinrisk_core::{ClinicalObservation, ErrorReport, RiskAssessment, RiskEngine, RiskError};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub type SharedEngine = Arc<RiskEngine>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub bundle_fingerprint: String,
    pub features: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    report: ErrorReport,
}

impl From<RiskError> for ApiError {
    fn from(err: RiskError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            error!(error = %err, "assessment failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            report: err.report(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            report: ErrorReport {
                error: "invalid_request".to_string(),
                field: None,
                message: rejection.body_text(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.report)).into_response()
    }
}

pub fn build_router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn handle_health(State(engine): State<SharedEngine>) -> Json<HealthResponse> {
    let bundle = engine.bundle();
    Json(HealthResponse {
        status: "operational",
        version: clinrisk_core::VERSION,
        bundle_fingerprint: bundle.fingerprint().to_string(),
        features: bundle.feature_order().to_vec(),
    })
}

async fn handle_predict(
    State(engine): State<SharedEngine>,
    payload: Result<Json<ClinicalObservation>, JsonRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let Json(observation) = payload?;
    let assessment = engine.assess(&observation)?;
    Ok(Json(assessment))
}

pub async fn serve(engine: SharedEngine, addr: &str) -> Result<()> {
    let app = build_router(engine);
    let listener = bind_listener(addr).await?;
    info!("clinrisk service listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}
