//! Set-to-optimal actions

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ActionDraft, Dimension};
use crate::models::{AggregatedResource, FixOperation, OperationKind};
use crate::pricing::CostModel;

/// Changes within this many percent of the request are treated as noise
pub const NOISE_BAND_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetPolicy {
    pub noise_band_percent: f64,
}

impl Default for TargetPolicy {
    fn default() -> Self {
        Self {
            noise_band_percent: NOISE_BAND_PERCENT,
        }
    }
}

pub(super) fn evaluate(
    resource: &AggregatedResource,
    dim: &Dimension,
    policy: &TargetPolicy,
    model: &CostModel,
) -> Option<ActionDraft> {
    let requested = dim.requested;
    let optimal = dim.optimal;

    if !requested.is_finite() || requested.abs() < f64::EPSILON {
        warn!(
            resource = %resource.resource,
            intent = %dim.intent,
            requested = requested,
            "Suppressing set-to action against a zero request"
        );
        return None;
    }

    let change_percent = (optimal - requested) / requested * 100.0;
    if !change_percent.is_finite() {
        warn!(
            resource = %resource.resource,
            intent = %dim.intent,
            "Suppressing set-to action with a non-finite change"
        );
        return None;
    }

    if change_percent.abs() <= policy.noise_band_percent {
        debug!(
            resource = %resource.resource,
            intent = %dim.intent,
            change_percent = change_percent,
            "Change within noise band, no action"
        );
        return None;
    }

    let field = dim.field();
    let target = dim.quote(optimal);

    Some(ActionDraft {
        intent: dim.intent,
        description: format!(
            "{} request {} -> {} ({:.1}% change)",
            dim.label,
            dim.quote(requested),
            target,
            change_percent
        ),
        operation: FixOperation {
            field: field.to_string(),
            operation: OperationKind::SetTo,
            value: optimal,
            unit: dim.unit.to_string(),
        },
        guidance: format!(
            "Update the Kubernetes manifest for '{}': set {} to {}. \
             Preserve the unit suffix used in the manifest. If {} is missing, create it.",
            resource.resource, field, target, field
        ),
        estimated_savings_usd: (dim.price)(model, requested - optimal),
    })
}
