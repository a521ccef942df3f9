//! Engine policy configuration
//!
//! Every knob that drives a recommendation lives here with its default.
//! Binaries layer files and environment variables on top.

use serde::{Deserialize, Serialize};

use crate::decision::DecisionPolicy;
use crate::error::{AdvisorError, AdvisorResult};
use crate::fixes::FixPolicy;
use crate::plan::PlanPolicy;
use crate::pricing::{CostModel, PricingConfig};
use crate::sizing::{OptimalPolicy, RequestPolicy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pricing: PricingConfig,
    pub requests: RequestPolicy,
    pub optimal: OptimalPolicy,
    pub fixes: FixPolicy,
    pub plan: PlanPolicy,
    pub decision: DecisionPolicy,
}

impl EngineConfig {
    pub fn cost_model(&self) -> CostModel {
        CostModel::with_config(self.pricing.clone())
    }

    /// Reject values that would make costs or percentages meaningless
    pub fn validate(&self) -> AdvisorResult<()> {
        non_negative("pricing.cpu_rate_per_milli_hour", self.pricing.cpu_rate_per_milli_hour)?;
        non_negative("pricing.memory_rate_per_gb_hour", self.pricing.memory_rate_per_gb_hour)?;

        positive("requests.headroom_factor", self.requests.headroom_factor)?;
        non_negative("requests.cpu_floor_milli", self.requests.cpu_floor_milli)?;
        non_negative("requests.memory_floor_gb", self.requests.memory_floor_gb)?;
        positive("optimal.headroom_factor", self.optimal.headroom_factor)?;

        let threshold = &self.fixes.threshold;
        positive("fixes.threshold.scale_down_usage_ratio", threshold.scale_down_usage_ratio)?;
        positive("fixes.threshold.scale_up_usage_ratio", threshold.scale_up_usage_ratio)?;
        for (name, value) in [
            ("fixes.threshold.cpu_scale_down_percent", threshold.cpu_scale_down_percent),
            ("fixes.threshold.memory_scale_down_percent", threshold.memory_scale_down_percent),
        ] {
            if !value.is_finite() || value >= 0.0 || value <= -100.0 {
                return Err(AdvisorError::InvalidConfig(format!(
                    "{} must be in (-100, 0), got {}",
                    name, value
                )));
            }
        }
        positive("fixes.threshold.cpu_scale_up_percent", threshold.cpu_scale_up_percent)?;
        positive("fixes.threshold.memory_scale_up_percent", threshold.memory_scale_up_percent)?;
        non_negative("fixes.target.noise_band_percent", self.fixes.target.noise_band_percent)?;

        non_negative("plan.approval_threshold_usd", self.plan.approval_threshold_usd)?;

        let decision = &self.decision;
        non_negative("decision.medium_risk_change_percent", decision.medium_risk_change_percent)?;
        non_negative("decision.high_risk_change_percent", decision.high_risk_change_percent)?;
        if decision.medium_risk_change_percent > decision.high_risk_change_percent {
            return Err(AdvisorError::InvalidConfig(format!(
                "decision.medium_risk_change_percent ({}) exceeds decision.high_risk_change_percent ({})",
                decision.medium_risk_change_percent, decision.high_risk_change_percent
            )));
        }
        non_negative("decision.min_savings_usd", decision.min_savings_usd)?;
        non_negative("decision.set_to_change_percent", decision.set_to_change_percent)?;

        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> AdvisorResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AdvisorError::InvalidConfig(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )))
    }
}

fn positive(name: &str, value: f64) -> AdvisorResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AdvisorError::InvalidConfig(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixes::FixStrategy;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let cfg: EngineConfig = serde_json::from_str(
            r#"{"fixes": {"strategy": "threshold"}, "plan": {"approval_threshold_usd": 10}}"#,
        )
        .unwrap();
        assert_eq!(cfg.fixes.strategy, FixStrategy::Threshold);
        assert_eq!(cfg.plan.approval_threshold_usd, 10.0);
        assert_eq!(cfg.requests, RequestPolicy::default());
        assert_eq!(cfg.decision, DecisionPolicy::default());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.pricing.cpu_rate_per_milli_hour = -1.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("pricing.cpu_rate_per_milli_hour"));
    }

    #[test]
    fn test_inverted_risk_bands_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.decision.medium_risk_change_percent = 60.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_positive_scale_down_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.fixes.threshold.cpu_scale_down_percent = 10.0;
        assert!(cfg.validate().is_err());
    }
}
