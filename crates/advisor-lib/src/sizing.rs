//! Requested and optimal allocation policies
//!
//! The requested allocation is what a workload currently reserves: the
//! supplied ground truth when it is complete, otherwise an estimate of
//! "peak with safety margin" (`max(p95 * headroom, floor)`).
//!
//! The optimal allocation sizes to the median with a smaller headroom
//! (`p50 * 1.2`), accepting rare throttling in exchange for cost.

use serde::{Deserialize, Serialize};

use crate::models::{Allocation, MetricStat};

/// Multiplier applied to p95 usage when inferring the requested allocation
pub const REQUEST_HEADROOM_FACTOR: f64 = 2.0;

/// Minimum viable CPU allocation in milli-cores
pub const CPU_FLOOR_MILLI: f64 = 50.0;

/// Minimum viable memory allocation in GB
pub const MEMORY_FLOOR_GB: f64 = 0.1;

/// Multiplier applied to p50 usage for the optimal allocation
pub const OPTIMAL_HEADROOM_FACTOR: f64 = 1.2;

/// How to infer a requested allocation when no ground truth is supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestPolicy {
    pub headroom_factor: f64,
    pub cpu_floor_milli: f64,
    pub memory_floor_gb: f64,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            headroom_factor: REQUEST_HEADROOM_FACTOR,
            cpu_floor_milli: CPU_FLOOR_MILLI,
            memory_floor_gb: MEMORY_FLOOR_GB,
        }
    }
}

impl RequestPolicy {
    pub fn infer_cpu(&self, p95_cpu_milli: f64) -> f64 {
        (p95_cpu_milli * self.headroom_factor).max(self.cpu_floor_milli)
    }

    pub fn infer_memory(&self, p95_memory_gb: f64) -> f64 {
        (p95_memory_gb * self.headroom_factor).max(self.memory_floor_gb)
    }
}

/// Target sizing relative to median usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimalPolicy {
    pub headroom_factor: f64,
}

impl Default for OptimalPolicy {
    fn default() -> Self {
        Self {
            headroom_factor: OPTIMAL_HEADROOM_FACTOR,
        }
    }
}

/// Allocation to treat as "currently requested".
///
/// A complete ground truth wins verbatim. Otherwise each measured
/// dimension is inferred from its p95; an unmeasured dimension is 0.
pub fn resolve_requests(
    cpu: Option<&MetricStat>,
    memory: Option<&MetricStat>,
    ground_truth: Option<&Allocation>,
    policy: &RequestPolicy,
) -> Allocation {
    if let Some(truth) = ground_truth.filter(|t| t.is_complete()) {
        return *truth;
    }

    Allocation {
        cpu_milli: cpu.map(|s| policy.infer_cpu(s.p95)).unwrap_or(0.0),
        memory_gb: memory.map(|s| policy.infer_memory(s.p95)).unwrap_or(0.0),
    }
}

/// Target allocation for each measured dimension.
///
/// An unmeasured dimension keeps its requested value so it contributes
/// no savings.
pub fn optimal_allocation(
    cpu: Option<&MetricStat>,
    memory: Option<&MetricStat>,
    requested: &Allocation,
    policy: &OptimalPolicy,
) -> Allocation {
    Allocation {
        cpu_milli: cpu
            .map(|s| s.p50 * policy.headroom_factor)
            .unwrap_or(requested.cpu_milli),
        memory_gb: memory
            .map(|s| s.p50 * policy.headroom_factor)
            .unwrap_or(requested.memory_gb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(p50: f64, p95: f64) -> MetricStat {
        MetricStat { p50, p95, avg: p50 }
    }

    #[test]
    fn test_infer_applies_headroom() {
        let req = resolve_requests(
            Some(&stat(100.0, 100.0)),
            Some(&stat(1.0, 1.0)),
            None,
            &RequestPolicy::default(),
        );
        assert_eq!(req, Allocation::new(200.0, 2.0));
    }

    #[test]
    fn test_infer_applies_floors() {
        let req = resolve_requests(
            Some(&stat(5.0, 10.0)),
            Some(&stat(0.01, 0.02)),
            None,
            &RequestPolicy::default(),
        );
        assert_eq!(req, Allocation::new(50.0, 0.1));
    }

    #[test]
    fn test_complete_ground_truth_is_used_verbatim() {
        let truth = Allocation::new(500.0, 4.0);
        let req = resolve_requests(
            Some(&stat(10.0, 10.0)),
            Some(&stat(0.5, 0.5)),
            Some(&truth),
            &RequestPolicy::default(),
        );
        assert_eq!(req, truth);
    }

    #[test]
    fn test_partial_ground_truth_is_ignored() {
        let truth = Allocation::new(500.0, 0.0);
        let req = resolve_requests(
            Some(&stat(100.0, 100.0)),
            Some(&stat(1.0, 1.0)),
            Some(&truth),
            &RequestPolicy::default(),
        );
        assert_eq!(req, Allocation::new(200.0, 2.0));
    }

    #[test]
    fn test_unmeasured_dimension_is_zero_and_unchanged() {
        let policy = RequestPolicy::default();
        let req = resolve_requests(Some(&stat(100.0, 150.0)), None, None, &policy);
        assert_eq!(req, Allocation::new(300.0, 0.0));

        let opt = optimal_allocation(Some(&stat(100.0, 150.0)), None, &req, &OptimalPolicy::default());
        assert!((opt.cpu_milli - 120.0).abs() < 1e-9);
        assert_eq!(opt.memory_gb, 0.0);
    }

    #[test]
    fn test_optimal_uses_configured_headroom() {
        let policy = OptimalPolicy {
            headroom_factor: 1.5,
        };
        let opt = optimal_allocation(
            Some(&stat(100.0, 400.0)),
            Some(&stat(2.0, 3.0)),
            &Allocation::default(),
            &policy,
        );
        assert_eq!(opt, Allocation::new(150.0, 3.0));
    }
}
