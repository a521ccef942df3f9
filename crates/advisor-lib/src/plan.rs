//! Plan assembly
//!
//! Totals every aggregated resource, collects the actions of each
//! resource's provider family and decides budget compliance and whether
//! a human has to sign off.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::EngineConfig;
use crate::models::{AggregatedResource, FixPlan};
use crate::scan::{aggregate_samples, ScanRequest};

/// Monthly savings above which even an auto-approved plan needs review
pub const APPROVAL_THRESHOLD_USD: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanPolicy {
    pub approval_threshold_usd: f64,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            approval_threshold_usd: APPROVAL_THRESHOLD_USD,
        }
    }
}

/// Per-invocation plan inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Monthly budget in USD, 0 for none
    pub budget_target_usd: f64,
    pub auto_approve: bool,
}

/// Scan input plus plan options in a single payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixPlanRequest {
    #[serde(flatten)]
    pub scan: ScanRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_target_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
}

impl FixPlanRequest {
    /// Options from the request, falling back to `defaults` for unset fields
    pub fn options(&self, defaults: PlanOptions) -> PlanOptions {
        PlanOptions {
            budget_target_usd: self.budget_target_usd.unwrap_or(defaults.budget_target_usd),
            auto_approve: self.auto_approve.unwrap_or(defaults.auto_approve),
        }
    }
}

/// Build a plan over already aggregated resources.
///
/// Each resource's actions get its 1-based position as priority.
pub fn assemble_plan(
    resources: &[AggregatedResource],
    options: PlanOptions,
    config: &EngineConfig,
) -> FixPlan {
    let mut total_current = 0.0;
    let mut total_optimal = 0.0;
    let mut actions = Vec::new();

    for (index, resource) in resources.iter().enumerate() {
        total_current += resource.cost_current_usd;
        total_optimal += resource.cost_optimal_usd;

        match resource.provider.family() {
            Some(family) => {
                actions.extend(family.fix_actions(resource, (index + 1) as u32, config));
            }
            None => warn!(
                provider = %resource.provider,
                resource = %resource.resource,
                "No fix generator for provider, resource counted in totals only"
            ),
        }
    }

    let total_savings = total_current - total_optimal;
    let budget = options.budget_target_usd;

    FixPlan {
        total_current_cost_usd: total_current,
        total_optimal_cost_usd: total_optimal,
        total_savings_usd: total_savings,
        budget_target_usd: budget,
        meets_budget: budget > 0.0 && total_optimal <= budget,
        requires_approval: !options.auto_approve
            || total_savings > config.plan.approval_threshold_usd,
        summary: format!(
            "Generated {} optimization actions with estimated savings ${:.2}/mo",
            actions.len(),
            total_savings
        ),
        actions,
    }
}

/// Aggregate the request's samples and assemble a plan over them
pub fn plan_from_request(
    request: &FixPlanRequest,
    defaults: PlanOptions,
    config: &EngineConfig,
) -> FixPlan {
    let resources = aggregate_samples(
        &request.scan.metrics,
        &request.scan.actual_requests,
        config,
    );
    assemble_plan(&resources, request.options(defaults), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricStat, Provider, CPU_METRIC};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn resource(name: &str, current: f64, optimal: f64) -> AggregatedResource {
        AggregatedResource {
            provider: Provider::Kubernetes,
            resource: name.to_string(),
            metrics: BTreeMap::new(),
            requested_cpu_milli: 0.0,
            requested_memory_gb: 0.0,
            optimal_cpu_milli: 0.0,
            optimal_memory_gb: 0.0,
            cost_current_usd: current,
            cost_optimal_usd: optimal,
            cost_savings_usd: current - optimal,
            data_points: 0,
        }
    }

    #[test]
    fn test_budget_and_approval_flags() {
        let resources = vec![resource("a", 100.0, 40.0), resource("b", 20.0, 10.0)];
        let config = EngineConfig::default();

        let plan = assemble_plan(
            &resources,
            PlanOptions {
                budget_target_usd: 60.0,
                auto_approve: true,
            },
            &config,
        );
        assert_eq!(plan.total_current_cost_usd, 120.0);
        assert_eq!(plan.total_optimal_cost_usd, 50.0);
        assert_eq!(plan.total_savings_usd, 70.0);
        assert!(plan.meets_budget);
        // auto-approved but above the $50 threshold
        assert!(plan.requires_approval);
        assert_eq!(
            plan.summary,
            "Generated 0 optimization actions with estimated savings $70.00/mo"
        );
    }

    #[test]
    fn test_zero_budget_never_meets() {
        let plan = assemble_plan(
            &[resource("a", 1.0, 0.5)],
            PlanOptions::default(),
            &EngineConfig::default(),
        );
        assert!(!plan.meets_budget);
        assert!(plan.requires_approval);
    }

    #[test]
    fn test_small_auto_approved_plan_needs_no_approval() {
        let plan = assemble_plan(
            &[resource("a", 10.0, 5.0)],
            PlanOptions {
                budget_target_usd: 1.0,
                auto_approve: true,
            },
            &EngineConfig::default(),
        );
        assert!(!plan.meets_budget);
        assert!(!plan.requires_approval);
    }

    #[test]
    fn test_actions_carry_resource_position() {
        let mut first = resource("first", 0.0, 0.0);
        let mut second = resource("second", 0.0, 0.0);
        for (res, requested) in [(&mut first, 200.0), (&mut second, 1000.0)] {
            res.metrics.insert(
                CPU_METRIC.to_string(),
                MetricStat {
                    p50: 50.0,
                    p95: 60.0,
                    avg: 50.0,
                },
            );
            res.requested_cpu_milli = requested;
            res.optimal_cpu_milli = 60.0;
        }

        let plan = assemble_plan(&[first, second], PlanOptions::default(), &EngineConfig::default());
        let priorities: Vec<_> = plan.actions.iter().map(|a| (a.resource.as_str(), a.priority)).collect();
        assert_eq!(priorities, vec![("first", 1), ("second", 2)]);
    }

    #[test]
    fn test_request_options_override_defaults() {
        let request: FixPlanRequest =
            serde_json::from_str(r#"{"metrics": [], "auto_approve": true}"#).unwrap();
        let options = request.options(PlanOptions {
            budget_target_usd: 25.0,
            auto_approve: false,
        });
        assert_eq!(options.budget_target_usd, 25.0);
        assert!(options.auto_approve);
    }

    proptest! {
        #[test]
        fn plan_savings_equal_current_minus_optimal(
            costs in prop::collection::vec((0.0f64..1.0e4, 0.0f64..1.0e4), 0..20)
        ) {
            let resources: Vec<_> = costs
                .iter()
                .enumerate()
                .map(|(i, (c, o))| resource(&format!("r{}", i), *c, *o))
                .collect();
            let plan = assemble_plan(&resources, PlanOptions::default(), &EngineConfig::default());
            prop_assert!(
                (plan.total_savings_usd - (plan.total_current_cost_usd - plan.total_optimal_cost_usd)).abs()
                    < 1e-9
            );
        }
    }
}
