//! Fix action generation
//!
//! Two sizing policies turn an aggregated resource into rightsizing
//! actions, selected by [`FixStrategy`]:
//!
//! - `target` (default): set each request to the optimal allocation when
//!   it differs from the current one by more than a noise band.
//! - `threshold`: nudge a request by a fixed percentage when average
//!   usage is far below it, or p95 usage is close to it.
//!
//! A dimension without measurements never yields an action, and a
//! percentage against a zero request is suppressed instead of emitting a
//! non-finite value.
//!
//! Estimated savings follow [`SavingsAttribution`]: by default they are
//! derived from the resource's costs, optionally priced per dimension.

mod target;
mod threshold;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::models::{
    AggregatedResource, FixAction, FixOperation, Intent, MetricStat, OperationKind, RiskLevel,
};
use crate::pricing::CostModel;

pub use target::{TargetPolicy, NOISE_BAND_PERCENT};
pub use threshold::{
    ThresholdPolicy, CPU_SCALE_DOWN_PERCENT, CPU_SCALE_UP_PERCENT, MEMORY_SCALE_DOWN_PERCENT,
    MEMORY_SCALE_UP_PERCENT, SCALE_DOWN_USAGE_RATIO, SCALE_UP_USAGE_RATIO,
};

/// Which sizing policy generates actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStrategy {
    /// Set requests to the optimal allocation
    #[default]
    Target,
    /// Scale requests by fixed percentages around usage thresholds
    Threshold,
}

impl FixStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixStrategy::Target => "target",
            FixStrategy::Threshold => "threshold",
        }
    }
}

impl fmt::Display for FixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "target" => Ok(FixStrategy::Target),
            "threshold" => Ok(FixStrategy::Threshold),
            other => Err(format!(
                "unknown fix strategy '{}' (expected 'target' or 'threshold')",
                other
            )),
        }
    }
}

/// How an action's estimated savings are derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsAttribution {
    /// Set-to actions split the resource's savings evenly; a percentage
    /// nudge saves that percentage of the resource's current cost
    #[default]
    Resource,
    /// Price the change on the action's own dimension only
    Dimension,
}

/// Fix generation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixPolicy {
    pub strategy: FixStrategy,
    pub savings: SavingsAttribution,
    pub threshold: ThresholdPolicy,
    pub target: TargetPolicy,
}

/// One resizable dimension of a resource, as seen by the generators
#[derive(Debug, Clone)]
pub struct Dimension {
    pub intent: Intent,
    /// Human label used in descriptions ("CPU", "Memory")
    pub label: &'static str,
    /// Unit suffix for absolute values ("m", "GB")
    pub unit: &'static str,
    /// Decimal places when quoting measured values
    pub precision: usize,
    pub stat: Option<MetricStat>,
    pub requested: f64,
    pub optimal: f64,
    pub scale_down_percent: f64,
    pub scale_up_percent: f64,
    /// Prices an amount of this dimension alone
    pub price: fn(&CostModel, f64) -> f64,
}

impl Dimension {
    pub fn field(&self) -> &'static str {
        self.intent.field()
    }

    fn quote(&self, value: f64) -> String {
        format!("{:.*}{}", self.precision, value, self.unit)
    }
}

/// Run the configured strategy over the given dimensions
pub fn generate_actions(
    resource: &AggregatedResource,
    dimensions: &[Dimension],
    priority: u32,
    config: &EngineConfig,
) -> Vec<FixAction> {
    let model = config.cost_model();

    let mut drafts: Vec<ActionDraft> = dimensions
        .iter()
        .filter_map(|dim| {
            let stat = dim.stat?;
            let drafts = match config.fixes.strategy {
                FixStrategy::Threshold => {
                    threshold::evaluate(resource, dim, &stat, &config.fixes.threshold, &model)
                }
                FixStrategy::Target => target::evaluate(resource, dim, &config.fixes.target, &model)
                    .into_iter()
                    .collect(),
            };
            Some(drafts)
        })
        .flatten()
        .collect();

    if config.fixes.savings == SavingsAttribution::Resource {
        let count = drafts.len() as f64;
        for draft in &mut drafts {
            draft.estimated_savings_usd = match draft.operation.operation {
                OperationKind::SetTo => resource.cost_savings_usd / count,
                OperationKind::ScaleByPercentage => {
                    resource.cost_current_usd * -(draft.operation.value / 100.0)
                }
            };
        }
    }

    drafts
        .into_iter()
        .map(|draft| draft.into_action(resource, priority))
        .collect()
}

/// A generated change before it is bound to its resource
struct ActionDraft {
    intent: Intent,
    description: String,
    operation: FixOperation,
    guidance: String,
    estimated_savings_usd: f64,
}

impl ActionDraft {
    fn into_action(self, resource: &AggregatedResource, priority: u32) -> FixAction {
        FixAction {
            provider: resource.provider,
            resource: resource.resource.clone(),
            intent: self.intent,
            description: self.description,
            action: self.operation,
            estimated_savings_usd: self.estimated_savings_usd,
            guidance: self.guidance,
            files_to_edit: Vec::new(),
            risk_level: RiskLevel::Low,
            priority,
        }
    }
}
