//! Rightsizing engine for infrastructure workloads
//!
//! This crate provides:
//! - Percentile/average aggregation of utilization samples
//! - Requested and optimal allocation sizing, priced by a cost model
//! - Fix action generation (target or threshold strategy)
//! - Plan assembly and apply/defer/skip decision ranking
//! - A best-effort manifest applier, health checks and observability
//!
//! Every stage is a pure function of its inputs and an [`EngineConfig`].

pub mod apply;
pub mod config;
pub mod decision;
pub mod error;
pub mod fixes;
pub mod health;
pub mod models;
pub mod observability;
pub mod plan;
pub mod pricing;
pub mod provider;
pub mod scan;
pub mod sizing;
pub mod stats;

pub use config::EngineConfig;
pub use decision::{rank_decisions, DecisionPolicy};
pub use error::{parse_json, AdvisorError, AdvisorResult};
pub use fixes::{FixStrategy, SavingsAttribution};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use plan::{assemble_plan, plan_from_request, FixPlanRequest, PlanOptions};
pub use scan::{run_scan, ScanReport, ScanRequest};

use serde::{Deserialize, Serialize};

/// Plan and ranked decisions from one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub plan: FixPlan,
    pub decisions: DecisionSummary,
}

/// Samples in, plan and decisions out
pub fn run_pipeline(
    request: &FixPlanRequest,
    defaults: PlanOptions,
    config: &EngineConfig,
) -> PipelineOutput {
    let plan = plan_from_request(request, defaults, config);
    let decisions = rank_decisions(&plan, &config.decision);
    PipelineOutput { plan, decisions }
}
