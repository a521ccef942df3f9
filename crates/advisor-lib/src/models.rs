//! Core data models for the rightsizing engine
//!
//! Field names are the JSON contract shared by the service, the CLI and
//! any later pass that re-reads a persisted scan or plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metric name for CPU usage in milli-cores
pub const CPU_METRIC: &str = "cpu_milli";

/// Metric name for memory usage in gigabytes
pub const MEMORY_METRIC: &str = "memory_gb";

/// Infrastructure platform family a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Kubernetes,
    AwsLambda,
    AwsEc2,
    Vercel,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Kubernetes => "kubernetes",
            Provider::AwsLambda => "aws_lambda",
            Provider::AwsEc2 => "aws_ec2",
            Provider::Vercel => "vercel",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One usage sample produced by an external collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub provider: Provider,
    pub resource: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, rename = "resource_metrics")]
    pub metrics: ResourceMetrics,
}

/// Raw metric values, one optional block per provider family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s_resource: Option<K8sResourceMetrics>,
}

/// Kubernetes container usage. A missing field means "not measured".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct K8sResourceMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_milli: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
}

/// A CPU/memory allocation (requested, optimal or ground truth)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub cpu_milli: f64,
    pub memory_gb: f64,
}

impl Allocation {
    pub fn new(cpu_milli: f64, memory_gb: f64) -> Self {
        Self {
            cpu_milli,
            memory_gb,
        }
    }

    /// Both components are strictly positive
    pub fn is_complete(&self) -> bool {
        self.cpu_milli > 0.0 && self.memory_gb > 0.0
    }
}

/// Summary statistics for one metric dimension of one resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStat {
    pub p50: f64,
    pub p95: f64,
    pub avg: f64,
}

/// Per-resource aggregation result of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResource {
    pub provider: Provider,
    pub resource: String,
    pub metrics: BTreeMap<String, MetricStat>,

    pub requested_cpu_milli: f64,
    pub requested_memory_gb: f64,

    pub optimal_cpu_milli: f64,
    pub optimal_memory_gb: f64,

    pub cost_current_usd: f64,
    pub cost_optimal_usd: f64,
    pub cost_savings_usd: f64,

    pub data_points: usize,
}

impl AggregatedResource {
    pub fn cpu(&self) -> Option<&MetricStat> {
        self.metrics.get(CPU_METRIC)
    }

    pub fn memory(&self) -> Option<&MetricStat> {
        self.metrics.get(MEMORY_METRIC)
    }

    pub fn requested(&self) -> Allocation {
        Allocation::new(self.requested_cpu_milli, self.requested_memory_gb)
    }

    pub fn optimal(&self) -> Allocation {
        Allocation::new(self.optimal_cpu_milli, self.optimal_memory_gb)
    }
}

/// What a fix action is trying to achieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RightsizeCpuRequest,
    RightsizeMemoryRequest,
    /// Any intent this engine does not generate itself
    #[serde(other)]
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::RightsizeCpuRequest => "rightsize_cpu_request",
            Intent::RightsizeMemoryRequest => "rightsize_memory_request",
            Intent::Other => "other",
        }
    }

    /// Declarative configuration field changed by this intent
    pub fn field(&self) -> &'static str {
        match self {
            Intent::RightsizeCpuRequest => "resources.requests.cpu",
            Intent::RightsizeMemoryRequest => "resources.requests.memory",
            Intent::Other => "",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ScaleByPercentage,
    SetTo,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ScaleByPercentage => "scale_by_percentage",
            OperationKind::SetTo => "set_to",
        }
    }
}

/// The concrete edit a fix action asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixOperation {
    pub field: String,
    pub operation: OperationKind,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recommended change to a resource's allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixAction {
    pub provider: Provider,
    pub resource: String,
    pub intent: Intent,
    pub description: String,
    pub action: FixOperation,
    #[serde(default)]
    pub estimated_savings_usd: f64,
    pub guidance: String,
    /// Filled by an external applier, empty when generated
    #[serde(default)]
    pub files_to_edit: Vec<String>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub priority: u32,
}

/// Totals and ordered actions for one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixPlan {
    pub total_current_cost_usd: f64,
    pub total_optimal_cost_usd: f64,
    pub total_savings_usd: f64,
    #[serde(default)]
    pub budget_target_usd: f64,
    #[serde(default)]
    pub meets_budget: bool,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub actions: Vec<FixAction>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Apply,
    Defer,
    Skip,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Apply => "apply",
            Verdict::Defer => "defer",
            Verdict::Skip => "skip",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking verdict for one fix action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// `action-<n>` where n is the action's index in the plan
    pub action_id: String,
    pub resource: String,
    pub intent: Intent,
    pub decision: Verdict,
    pub rationale: String,
    pub priority: i32,
    pub risk_level: RiskLevel,
    pub estimated_savings_usd: f64,
}

/// Ranked verdicts for every action of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub total_actions: usize,
    pub actions_to_apply: usize,
    pub actions_deferred: usize,
    pub actions_skipped: usize,
    pub total_savings_usd: f64,
    pub decisions: Vec<Decision>,
    pub summary: String,
}

impl DecisionSummary {
    /// Decisions with an "apply" verdict, in ranked order
    pub fn to_apply(&self) -> impl Iterator<Item = &Decision> {
        self.decisions
            .iter()
            .filter(|d| d.decision == Verdict::Apply)
    }
}
