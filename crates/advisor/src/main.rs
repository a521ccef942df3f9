//! Rightsize Advisor - rightsizing recommendations over HTTP
//!
//! Accepts utilization samples and answers with scan reports, fix plans
//! and ranked apply/defer/skip decisions.

use advisor_lib::{
    health::{components, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
};
use anyhow::Result;
use rightsize_advisor::{api, config::AdvisorConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ADVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting rightsize-advisor");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::METRICS).await;

    let config = match AdvisorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Configuration rejected");
            return Err(e);
        }
    };
    health_registry.register(components::ENGINE).await;
    info!(
        port = config.port,
        fix_strategy = %config.engine.fixes.strategy,
        budget_target_usd = config.budget_target_usd,
        auto_approve = config.auto_approve,
        "Advisor configured"
    );

    let metrics = AdvisorMetrics::new();
    let logger = StructuredLogger::new("advisor");
    logger.log_startup(
        ADVISOR_VERSION,
        &format!("0.0.0.0:{}", config.port),
        config.engine.fixes.strategy.as_str(),
    );

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        config.engine.clone(),
        config.plan_defaults(),
    ));

    health_registry.set_ready(true).await;

    let shutdown_logger = logger.clone();
    api::serve(config.port, app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
