//! Integration tests for the advisor API endpoints

use advisor_lib::{
    health::{components, HealthRegistry},
    observability::AdvisorMetrics,
    EngineConfig, FixStrategy, PlanOptions,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rightsize_advisor::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_app_with(engine: EngineConfig) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::METRICS).await;

    let state = Arc::new(AppState::new(
        health_registry,
        AdvisorMetrics::new(),
        engine,
        PlanOptions::default(),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    setup_test_app_with(EngineConfig::default()).await
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn samples(resource: &str, cpu: f64, memory: f64, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "provider": "kubernetes",
                "resource": resource,
                "timestamp": 1_700_000_000 + i as i64,
                "resource_metrics": {"k8s_resource": {"cpu_milli": cpu, "memory_gb": memory}}
            })
        })
        .collect()
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["engine"].is_object());
    assert!(health["components"]["metrics"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_unhealthy(components::ENGINE, "invalid config")
        .await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_initialization() {
    let (app, state) = setup_test_app().await;
    let (status, _) = get(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;
    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    let readiness: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_scan_returns_report() {
    let (app, _state) = setup_test_app().await;
    let mut metrics = samples("api", 100.0, 1.0, 10);
    metrics.extend(samples("worker", 1000.0, 4.0, 10));

    let (status, report) = post_json(app, "/v1/scan", json!({ "metrics": metrics }).to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["summary"]["resources_analyzed"], 2);
    assert_eq!(report["summary"]["top_offenders"], json!(["worker", "api"]));
    assert_eq!(report["resources"][1]["requested_cpu_milli"], 200.0);
    assert!(report["resources"][0]["metrics"]["cpu_milli"]["p95"].is_number());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post_json(app, "/v1/scan", r#"{"metrics": 42}"#.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("malformed scan request"));
}

#[tokio::test]
async fn test_fixplans_applies_request_options() {
    let (app, _state) = setup_test_app().await;
    let body = json!({
        "metrics": samples("api", 100.0, 1.0, 10),
        "budget_target_usd": 10.0,
        "auto_approve": true
    });

    let (status, plan) = post_json(app, "/v1/fixplans", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["actions"].as_array().unwrap().len(), 2);
    assert_eq!(plan["actions"][0]["action"]["operation"], "set_to");
    assert_eq!(plan["meets_budget"], true);
    assert_eq!(plan["requires_approval"], false);
    assert_eq!(plan["budget_target_usd"], 10.0);
}

#[tokio::test]
async fn test_threshold_strategy_from_engine_config() {
    let mut engine = EngineConfig::default();
    engine.fixes.strategy = FixStrategy::Threshold;
    let (app, _state) = setup_test_app_with(engine).await;

    let body = json!({ "metrics": samples("idle", 5.0, 0.01, 10) });
    let (status, plan) = post_json(app, "/v1/fixplans", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["actions"][0]["action"]["operation"], "scale_by_percentage");
    assert_eq!(plan["actions"][0]["action"]["value"], -40.0);
}

#[tokio::test]
async fn test_decisions_rank_plan() {
    let (app, _state) = setup_test_app().await;
    let action = |resource: &str, savings: f64| {
        json!({
            "provider": "kubernetes",
            "resource": resource,
            "intent": "rightsize_cpu_request",
            "description": format!("shrink {}", resource),
            "action": {"field": "resources.requests.cpu", "operation": "scale_by_percentage", "value": -40.0, "unit": "percentage"},
            "estimated_savings_usd": savings,
            "guidance": ""
        })
    };
    let plan = json!({
        "total_current_cost_usd": 30.0,
        "total_optimal_cost_usd": 4.5,
        "total_savings_usd": 25.5,
        "actions": [action("a", 5.0), action("b", 0.5), action("c", 20.0)]
    });

    let (status, summary) = post_json(app, "/v1/decisions", plan.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["actions_to_apply"], 2);
    assert_eq!(summary["actions_skipped"], 1);
    assert_eq!(summary["total_savings_usd"], 25.0);
    assert_eq!(summary["decisions"][0]["action_id"], "action-2");
    assert_eq!(summary["decisions"][2]["decision"], "skip");
}

#[tokio::test]
async fn test_pipeline_returns_plan_and_decisions() {
    let (app, _state) = setup_test_app().await;
    let body = json!({
        "metrics": samples("api", 100.0, 1.0, 10),
        "actual_requests": {"api": {"cpu_milli": 1000.0, "memory_gb": 4.0}}
    });

    let (status, out) = post_json(app, "/v1/pipeline", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["plan"]["actions"].as_array().unwrap().len(), 2);
    assert_eq!(out["decisions"]["total_actions"], 2);
    assert_eq!(out["decisions"]["decisions"][0]["decision"], "apply");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_advisor_metrics() {
    let (app, state) = setup_test_app().await;
    state.metrics.observe_scan_latency(0.001);
    state.metrics.add_samples_ingested(3);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("rightsize_advisor_scan_latency_seconds_bucket"));
    assert!(text.contains("rightsize_advisor_samples_ingested_total"));
}
