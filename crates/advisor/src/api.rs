//! HTTP API: engine endpoints, health checks and Prometheus metrics

use advisor_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
    parse_json, plan_from_request, rank_decisions, run_pipeline, run_scan, AdvisorError,
    EngineConfig, FixPlan, FixPlanRequest, PlanOptions, ScanRequest,
};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared application state.
///
/// Only configuration and observability handles are shared; every
/// request computes its results from scratch.
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    pub logger: StructuredLogger,
    pub engine: Arc<EngineConfig>,
    pub defaults: PlanOptions,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: AdvisorMetrics,
        engine: EngineConfig,
        defaults: PlanOptions,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger: StructuredLogger::new("api"),
            engine: Arc::new(engine),
            defaults,
        }
    }

    /// Parse a request body, counting rejections
    fn parse<T: serde::de::DeserializeOwned>(
        &self,
        context: &'static str,
        body: &[u8],
    ) -> Result<T, ApiError> {
        parse_json(context, body).map_err(|e| {
            self.metrics.inc_malformed_requests();
            warn!(error = %e, "Rejected malformed request");
            ApiError(e)
        })
    }
}

/// Engine errors rendered as `{"error": "..."}`
pub struct ApiError(AdvisorError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AdvisorError::MalformedInput { .. } | AdvisorError::InvalidConfig(_) => {
                StatusCode::BAD_REQUEST
            }
            AdvisorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        state
            .health_registry
            .set_degraded(components::METRICS, e.to_string())
            .await;
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn scan(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: ScanRequest = state.parse("scan request", &body)?;

    let started = Instant::now();
    let report = run_scan(&request, &state.engine);
    state.metrics.observe_scan_latency(started.elapsed().as_secs_f64());
    state.metrics.add_samples_ingested(request.metrics.len());
    state
        .metrics
        .add_resources_aggregated(report.summary.resources_analyzed);
    state.logger.log_scan(request.metrics.len(), &report);

    Ok(Json(report).into_response())
}

async fn fixplans(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: FixPlanRequest = state.parse("fix plan request", &body)?;

    let started = Instant::now();
    let plan = plan_from_request(&request, state.defaults, &state.engine);
    state.metrics.observe_scan_latency(started.elapsed().as_secs_f64());
    state.metrics.add_samples_ingested(request.scan.metrics.len());
    state.metrics.add_actions_generated(plan.actions.len());
    state.logger.log_plan(&plan);

    Ok(Json(plan).into_response())
}

async fn decisions(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let plan: FixPlan = state.parse("fix plan", &body)?;

    let summary = rank_decisions(&plan, &state.engine.decision);
    state.metrics.record_decisions(&summary);
    state.logger.log_decisions(&summary);

    Ok(Json(summary).into_response())
}

async fn pipeline(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: FixPlanRequest = state.parse("fix plan request", &body)?;

    let started = Instant::now();
    let output = run_pipeline(&request, state.defaults, &state.engine);
    state.metrics.observe_scan_latency(started.elapsed().as_secs_f64());
    state.metrics.add_samples_ingested(request.scan.metrics.len());
    state.metrics.add_actions_generated(output.plan.actions.len());
    state.metrics.record_decisions(&output.decisions);
    state.logger.log_plan(&output.plan);
    state.logger.log_decisions(&output.decisions);

    Ok(Json(output).into_response())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/scan", post(scan))
        .route("/v1/fixplans", post(fixplans))
        .route("/v1/decisions", post(decisions))
        .route("/v1/pipeline", post(pipeline))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
