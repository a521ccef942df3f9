//! Observability for the advisor
//!
//! Provides:
//! - Prometheus metrics (scan latency, ingestion and output volumes, verdicts)
//! - Structured logging of engine events with tracing
//!
//! Metrics are write-only; nothing in the engine reads them back.

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::apply::{ApplyOutcome, ApplyStatus};
use crate::models::{DecisionSummary, FixPlan, Verdict};
use crate::scan::ScanReport;

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// `None` when registration failed; every recording is then a no-op
static GLOBAL_METRICS: OnceLock<Option<AdvisorMetricsInner>> = OnceLock::new();

struct AdvisorMetricsInner {
    scan_latency_seconds: Histogram,
    samples_ingested: IntCounter,
    resources_aggregated: IntCounter,
    actions_generated: IntCounter,
    decisions: IntCounterVec,
    malformed_requests: IntCounter,
}

impl AdvisorMetricsInner {
    fn register() -> prometheus::Result<Self> {
        Ok(Self {
            scan_latency_seconds: register_histogram!(
                "rightsize_advisor_scan_latency_seconds",
                "Time spent aggregating samples and building results",
                LATENCY_BUCKETS.to_vec()
            )?,
            samples_ingested: register_int_counter!(
                "rightsize_advisor_samples_ingested_total",
                "Metric samples received for aggregation"
            )?,
            resources_aggregated: register_int_counter!(
                "rightsize_advisor_resources_aggregated_total",
                "Distinct provider/resource pairs aggregated"
            )?,
            actions_generated: register_int_counter!(
                "rightsize_advisor_actions_generated_total",
                "Fix actions emitted into plans"
            )?,
            decisions: register_int_counter_vec!(
                "rightsize_advisor_decisions_total",
                "Ranked decisions by verdict",
                &["verdict"]
            )?,
            malformed_requests: register_int_counter!(
                "rightsize_advisor_malformed_requests_total",
                "Payloads rejected before any computation"
            )?,
        })
    }
}

/// Handle to the process-wide advisor metrics.
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(|| match AdvisorMetricsInner::register() {
            Ok(inner) => Some(inner),
            Err(e) => {
                warn!(error = %e, "Failed to register advisor metrics, recording disabled");
                None
            }
        });
        Self { _private: () }
    }

    fn inner(&self) -> Option<&AdvisorMetricsInner> {
        GLOBAL_METRICS.get().and_then(Option::as_ref)
    }

    pub fn observe_scan_latency(&self, duration_secs: f64) {
        if let Some(m) = self.inner() {
            m.scan_latency_seconds.observe(duration_secs);
        }
    }

    pub fn add_samples_ingested(&self, count: usize) {
        if let Some(m) = self.inner() {
            m.samples_ingested.inc_by(count as u64);
        }
    }

    pub fn add_resources_aggregated(&self, count: usize) {
        if let Some(m) = self.inner() {
            m.resources_aggregated.inc_by(count as u64);
        }
    }

    pub fn add_actions_generated(&self, count: usize) {
        if let Some(m) = self.inner() {
            m.actions_generated.inc_by(count as u64);
        }
    }

    pub fn record_decisions(&self, summary: &DecisionSummary) {
        if let Some(m) = self.inner() {
            for (verdict, count) in [
                (Verdict::Apply, summary.actions_to_apply),
                (Verdict::Defer, summary.actions_deferred),
                (Verdict::Skip, summary.actions_skipped),
            ] {
                m.decisions
                    .with_label_values(&[verdict.as_str()])
                    .inc_by(count as u64);
            }
        }
    }

    pub fn inc_malformed_requests(&self) {
        if let Some(m) = self.inner() {
            m.malformed_requests.inc();
        }
    }
}

/// Structured logger for advisor events
#[derive(Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn log_scan(&self, samples: usize, report: &ScanReport) {
        info!(
            event = "scan_completed",
            component = %self.component,
            samples = samples,
            resources = report.summary.resources_analyzed,
            total_current_cost_usd = report.summary.total_current_cost_usd,
            total_potential_savings_usd = report.summary.total_potential_savings_usd,
            top_offenders = ?report.summary.top_offenders,
            "Scan completed"
        );
    }

    pub fn log_plan(&self, plan: &FixPlan) {
        info!(
            event = "fix_plan_generated",
            component = %self.component,
            actions = plan.actions.len(),
            total_savings_usd = plan.total_savings_usd,
            budget_target_usd = plan.budget_target_usd,
            meets_budget = plan.meets_budget,
            requires_approval = plan.requires_approval,
            "Fix plan generated"
        );
    }

    pub fn log_decisions(&self, summary: &DecisionSummary) {
        info!(
            event = "decisions_ranked",
            component = %self.component,
            total_actions = summary.total_actions,
            apply = summary.actions_to_apply,
            defer = summary.actions_deferred,
            skip = summary.actions_skipped,
            savings_to_apply_usd = summary.total_savings_usd,
            "Decisions ranked"
        );
    }

    pub fn log_apply_outcome(&self, outcome: &ApplyOutcome) {
        let file = outcome
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match outcome.status {
            ApplyStatus::Failed => warn!(
                event = "manifest_apply",
                component = %self.component,
                action_id = %outcome.action_id,
                file = %file,
                status = %outcome.status,
                detail = %outcome.detail,
                "Manifest edit failed"
            ),
            _ => info!(
                event = "manifest_apply",
                component = %self.component,
                action_id = %outcome.action_id,
                file = %file,
                status = %outcome.status,
                detail = %outcome.detail,
                "Manifest edit attempted"
            ),
        }
    }

    pub fn log_dashboard_push(&self, url: &str, error: Option<&str>) {
        match error {
            None => info!(
                event = "dashboard_push",
                component = %self.component,
                url = %url,
                success = true,
                "Results sent to dashboard"
            ),
            Some(error) => warn!(
                event = "dashboard_push",
                component = %self.component,
                url = %url,
                success = false,
                error = %error,
                "Dashboard update failed, results kept locally"
            ),
        }
    }

    pub fn log_startup(&self, version: &str, listen_addr: &str, strategy: &str) {
        info!(
            event = "advisor_started",
            component = %self.component,
            version = %version,
            listen_addr = %listen_addr,
            fix_strategy = %strategy,
            "Rightsize advisor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "advisor_shutdown",
            component = %self.component,
            reason = %reason,
            "Rightsize advisor shutting down"
        );
    }
}
