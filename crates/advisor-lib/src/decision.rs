//! Decision ranking
//!
//! Ranks every action of a plan by its savings score and classifies it
//! as apply, defer or skip:
//!
//! 1. score = the action's own estimated savings when positive, else the
//!    plan's average savings per action
//! 2. stable sort by score, descending
//! 3. priority counts down from a base; change magnitude decides risk,
//!    and low-risk actions below the savings floor are skipped
//!
//! Change magnitude is only known for `set_to` on the two rightsize
//! intents. Percentage actions report 0 and therefore never defer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    Decision, DecisionSummary, FixAction, FixPlan, Intent, OperationKind, RiskLevel, Verdict,
};

pub const BASE_PRIORITY: i32 = 10;
pub const MEDIUM_RISK_CHANGE_PERCENT: f64 = 30.0;
pub const HIGH_RISK_CHANGE_PERCENT: f64 = 50.0;
pub const MIN_SAVINGS_USD: f64 = 1.0;

/// Nominal change magnitude assumed for a set-to rightsizing action
pub const SET_TO_CHANGE_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    pub base_priority: i32,
    pub medium_risk_change_percent: f64,
    pub high_risk_change_percent: f64,
    pub min_savings_usd: f64,
    pub set_to_change_percent: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            base_priority: BASE_PRIORITY,
            medium_risk_change_percent: MEDIUM_RISK_CHANGE_PERCENT,
            high_risk_change_percent: HIGH_RISK_CHANGE_PERCENT,
            min_savings_usd: MIN_SAVINGS_USD,
            set_to_change_percent: SET_TO_CHANGE_PERCENT,
        }
    }
}

/// An action paired with its plan index and savings score
#[derive(Debug, Clone, Copy)]
pub struct RankedAction<'a> {
    pub index: usize,
    pub score: f64,
    pub action: &'a FixAction,
}

/// Change magnitude in percent used for risk classification
pub fn change_magnitude(action: &FixAction, policy: &DecisionPolicy) -> f64 {
    match (action.action.operation, action.intent) {
        (OperationKind::SetTo, Intent::RightsizeCpuRequest | Intent::RightsizeMemoryRequest) => {
            policy.set_to_change_percent
        }
        _ => 0.0,
    }
}

/// Score and order the plan's actions, highest score first
pub fn rank_actions(plan: &FixPlan) -> Vec<RankedAction<'_>> {
    let average = if plan.actions.is_empty() {
        0.0
    } else {
        plan.total_savings_usd / plan.actions.len() as f64
    };

    let mut ranked: Vec<RankedAction<'_>> = plan
        .actions
        .iter()
        .enumerate()
        .map(|(index, action)| RankedAction {
            index,
            score: if action.estimated_savings_usd > 0.0 {
                action.estimated_savings_usd
            } else {
                average
            },
            action,
        })
        .collect();

    // stable: equal scores keep plan order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

pub fn rank_decisions(plan: &FixPlan, policy: &DecisionPolicy) -> DecisionSummary {
    let mut decisions = Vec::with_capacity(plan.actions.len());
    let mut to_apply = 0usize;
    let mut deferred = 0usize;
    let mut skipped = 0usize;
    let mut savings_to_apply = 0.0;

    for (rank, item) in rank_actions(plan).into_iter().enumerate() {
        let change = change_magnitude(item.action, policy);

        let (verdict, risk) = if change > policy.high_risk_change_percent {
            (Verdict::Defer, RiskLevel::High)
        } else if change > policy.medium_risk_change_percent {
            (Verdict::Defer, RiskLevel::Medium)
        } else if item.score < policy.min_savings_usd {
            (Verdict::Skip, RiskLevel::Low)
        } else {
            (Verdict::Apply, RiskLevel::Low)
        };

        match verdict {
            Verdict::Apply => {
                to_apply += 1;
                savings_to_apply += item.score;
            }
            Verdict::Defer => deferred += 1,
            Verdict::Skip => skipped += 1,
        }

        debug!(
            action_index = item.index,
            resource = %item.action.resource,
            score = item.score,
            change_percent = change,
            verdict = %verdict,
            "Ranked action"
        );

        decisions.push(Decision {
            action_id: format!("action-{}", item.index),
            resource: item.action.resource.clone(),
            intent: item.action.intent,
            decision: verdict,
            rationale: format!(
                "Savings: ${:.2}/month, Risk: {}, Change: {:.1}%. {}",
                item.score, risk, change, item.action.description
            ),
            priority: policy.base_priority - rank as i32,
            risk_level: risk,
            estimated_savings_usd: item.score,
        });
    }

    DecisionSummary {
        total_actions: plan.actions.len(),
        actions_to_apply: to_apply,
        actions_deferred: deferred,
        actions_skipped: skipped,
        total_savings_usd: savings_to_apply,
        decisions,
        summary: format!(
            "Decision summary: {} actions to apply (savings: ${:.2}/month), {} deferred, {} skipped",
            to_apply, savings_to_apply, deferred, skipped
        ),
    }
}
