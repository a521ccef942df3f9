//! Percentage nudges around usage thresholds

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ActionDraft, Dimension};
use crate::models::{AggregatedResource, FixOperation, MetricStat, OperationKind};
use crate::pricing::CostModel;

/// Scale down when average usage is below this share of the request
pub const SCALE_DOWN_USAGE_RATIO: f64 = 0.5;

/// Scale up when p95 usage is above this share of the request
pub const SCALE_UP_USAGE_RATIO: f64 = 0.9;

pub const CPU_SCALE_DOWN_PERCENT: f64 = -40.0;
pub const CPU_SCALE_UP_PERCENT: f64 = 25.0;
pub const MEMORY_SCALE_DOWN_PERCENT: f64 = -35.0;
pub const MEMORY_SCALE_UP_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    pub scale_down_usage_ratio: f64,
    pub scale_up_usage_ratio: f64,
    pub cpu_scale_down_percent: f64,
    pub cpu_scale_up_percent: f64,
    pub memory_scale_down_percent: f64,
    pub memory_scale_up_percent: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            scale_down_usage_ratio: SCALE_DOWN_USAGE_RATIO,
            scale_up_usage_ratio: SCALE_UP_USAGE_RATIO,
            cpu_scale_down_percent: CPU_SCALE_DOWN_PERCENT,
            cpu_scale_up_percent: CPU_SCALE_UP_PERCENT,
            memory_scale_down_percent: MEMORY_SCALE_DOWN_PERCENT,
            memory_scale_up_percent: MEMORY_SCALE_UP_PERCENT,
        }
    }
}

pub(super) fn evaluate(
    resource: &AggregatedResource,
    dim: &Dimension,
    stat: &MetricStat,
    policy: &ThresholdPolicy,
    model: &CostModel,
) -> Vec<ActionDraft> {
    let requested = dim.requested;
    if !requested.is_finite() || requested <= 0.0 {
        warn!(
            resource = %resource.resource,
            intent = %dim.intent,
            requested = requested,
            "Suppressing threshold action against a non-positive request"
        );
        return Vec::new();
    }

    let mut out = Vec::new();

    // Strict comparisons: usage exactly at a threshold is left alone
    if stat.avg < requested * policy.scale_down_usage_ratio {
        let explanation = format!(
            "{} avg {} < {:.0}% of requested {}",
            dim.label,
            dim.quote(stat.avg),
            policy.scale_down_usage_ratio * 100.0,
            dim.quote(requested),
        );
        out.push(draft(resource, dim, dim.scale_down_percent, explanation, model));
    }

    if stat.p95 > requested * policy.scale_up_usage_ratio {
        let explanation = format!(
            "{} p95 {} > {:.0}% of requested {}",
            dim.label,
            dim.quote(stat.p95),
            policy.scale_up_usage_ratio * 100.0,
            dim.quote(requested),
        );
        out.push(draft(resource, dim, dim.scale_up_percent, explanation, model));
    }

    out
}

fn draft(
    resource: &AggregatedResource,
    dim: &Dimension,
    percent: f64,
    explanation: String,
    model: &CostModel,
) -> ActionDraft {
    let field = dim.field();
    let released = -(percent / 100.0) * dim.requested;

    ActionDraft {
        intent: dim.intent,
        description: explanation,
        operation: FixOperation {
            field: field.to_string(),
            operation: OperationKind::ScaleByPercentage,
            value: percent,
            unit: "percentage".to_string(),
        },
        guidance: format!(
            "Locate the manifests for '{}' and change {} by {:+}%. \
             Preserve the existing unit suffix. If {} is missing, create it.",
            resource.resource, field, percent, field
        ),
        estimated_savings_usd: (dim.price)(model, released),
    }
}
