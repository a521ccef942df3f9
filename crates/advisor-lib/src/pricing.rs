//! Monthly cost model
//!
//! `cost = cpu_milli * cpu_rate * 24 * 30 + memory_gb * mem_rate * 24 * 30`
//!
//! The 720-hour month is fixed. Nothing is rounded here; rounding is left
//! to whoever renders the numbers.

use serde::{Deserialize, Serialize};

use crate::models::Allocation;

/// Hours in the amortized billing month (24 * 30)
pub const HOURS_PER_MONTH: f64 = 24.0 * 30.0;

/// Kubernetes CPU rate in USD per milli-core hour
pub const CPU_RATE_PER_MILLI_HOUR: f64 = 0.00001;

/// Kubernetes memory rate in USD per GB hour
pub const MEMORY_RATE_PER_GB_HOUR: f64 = 0.00002;

/// Unit rates for one provider family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub cpu_rate_per_milli_hour: f64,
    pub memory_rate_per_gb_hour: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cpu_rate_per_milli_hour: CPU_RATE_PER_MILLI_HOUR,
            memory_rate_per_gb_hour: MEMORY_RATE_PER_GB_HOUR,
        }
    }
}

/// Prices allocations with a fixed set of rates
#[derive(Debug, Clone, Default)]
pub struct CostModel {
    config: PricingConfig,
}

impl CostModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Monthly cost of the CPU dimension alone
    pub fn cpu_cost(&self, cpu_milli: f64) -> f64 {
        cpu_milli * self.config.cpu_rate_per_milli_hour * HOURS_PER_MONTH
    }

    /// Monthly cost of the memory dimension alone
    pub fn memory_cost(&self, memory_gb: f64) -> f64 {
        memory_gb * self.config.memory_rate_per_gb_hour * HOURS_PER_MONTH
    }

    /// Monthly cost of a CPU + memory allocation
    pub fn monthly_cost(&self, cpu_milli: f64, memory_gb: f64) -> f64 {
        self.cpu_cost(cpu_milli) + self.memory_cost(memory_gb)
    }

    pub fn allocation_cost(&self, allocation: &Allocation) -> f64 {
        self.monthly_cost(allocation.cpu_milli, allocation.memory_gb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_allocation_costs_nothing() {
        assert_eq!(CostModel::new().monthly_cost(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_default_rates() {
        let model = CostModel::new();
        // 200m * 0.00001 * 720 = 1.44, 2GB * 0.00002 * 720 = 0.0288
        assert!((model.cpu_cost(200.0) - 1.44).abs() < 1e-12);
        assert!((model.memory_cost(2.0) - 0.0288).abs() < 1e-12);
        assert!((model.monthly_cost(200.0, 2.0) - 1.4688).abs() < 1e-12);
    }

    #[test]
    fn test_custom_rates() {
        let model = CostModel::with_config(PricingConfig {
            cpu_rate_per_milli_hour: 0.001,
            memory_rate_per_gb_hour: 0.0,
        });
        assert!((model.monthly_cost(10.0, 100.0) - 7.2).abs() < 1e-9);
    }

    #[test]
    fn test_hours_per_month() {
        assert_eq!(HOURS_PER_MONTH, 720.0);
    }

    #[test]
    fn test_components_amortize_over_month() {
        let model = CostModel::with_config(PricingConfig {
            cpu_rate_per_milli_hour: 0.5,
            memory_rate_per_gb_hour: 0.25,
        });
        assert_eq!(model.cpu_cost(1.0), 0.5 * HOURS_PER_MONTH);
        assert_eq!(model.memory_cost(1.0), 0.25 * HOURS_PER_MONTH);
    }

    proptest! {
        #[test]
        fn cost_is_additive(cpu in 0.0f64..1.0e6, mem in 0.0f64..1.0e4) {
            let model = CostModel::new();
            prop_assert_eq!(
                model.monthly_cost(cpu, mem),
                model.cpu_cost(cpu) + model.memory_cost(mem)
            );
        }

        #[test]
        fn cost_is_monotonic_per_dimension(
            cpu in 0.0f64..1.0e6,
            mem in 0.0f64..1.0e4,
            extra in 0.0f64..1.0e3,
        ) {
            let model = CostModel::new();
            let base = model.monthly_cost(cpu, mem);
            prop_assert!(model.monthly_cost(cpu + extra, mem) >= base);
            prop_assert!(model.monthly_cost(cpu, mem + extra) >= base);
        }
    }
}
