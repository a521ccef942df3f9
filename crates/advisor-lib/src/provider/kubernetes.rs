//! Kubernetes container requests

use std::collections::BTreeMap;
use tracing::debug;

use super::ProviderFamily;
use crate::config::EngineConfig;
use crate::fixes::{generate_actions, Dimension};
use crate::models::{
    AggregatedResource, Allocation, FixAction, Intent, MetricSample, Provider, CPU_METRIC,
    MEMORY_METRIC,
};
use crate::pricing::CostModel;
use crate::sizing::{optimal_allocation, resolve_requests};
use crate::stats::summarize;

/// Pods and workloads measured in milli-cores and GB
#[derive(Debug, Clone, Copy, Default)]
pub struct Kubernetes;

impl ProviderFamily for Kubernetes {
    fn provider(&self) -> Provider {
        Provider::Kubernetes
    }

    fn aggregate(
        &self,
        resource: &str,
        samples: &[&MetricSample],
        ground_truth: Option<&Allocation>,
        config: &EngineConfig,
    ) -> AggregatedResource {
        let mut cpu_values = Vec::with_capacity(samples.len());
        let mut memory_values = Vec::with_capacity(samples.len());
        let mut dropped = 0usize;

        for sample in samples {
            let Some(k8s) = sample.metrics.k8s_resource.as_ref() else {
                continue;
            };
            for (value, into) in [
                (k8s.cpu_milli, &mut cpu_values),
                (k8s.memory_gb, &mut memory_values),
            ] {
                match value {
                    Some(v) if v.is_finite() && v >= 0.0 => into.push(v),
                    Some(_) => dropped += 1,
                    None => {}
                }
            }
        }

        let mut metrics = BTreeMap::new();
        if let Some(stat) = summarize(&cpu_values) {
            metrics.insert(CPU_METRIC.to_string(), stat);
        }
        if let Some(stat) = summarize(&memory_values) {
            metrics.insert(MEMORY_METRIC.to_string(), stat);
        }

        let cpu = metrics.get(CPU_METRIC);
        let memory = metrics.get(MEMORY_METRIC);
        let requested = resolve_requests(cpu, memory, ground_truth, &config.requests);
        let optimal = optimal_allocation(cpu, memory, &requested, &config.optimal);

        let model = config.cost_model();
        let cost_current_usd = model.allocation_cost(&requested);
        let cost_optimal_usd = model.allocation_cost(&optimal);

        debug!(
            resource = %resource,
            samples = samples.len(),
            cpu_points = cpu_values.len(),
            memory_points = memory_values.len(),
            dropped_values = dropped,
            requested_cpu_milli = requested.cpu_milli,
            requested_memory_gb = requested.memory_gb,
            optimal_cpu_milli = optimal.cpu_milli,
            optimal_memory_gb = optimal.memory_gb,
            "Aggregated kubernetes resource"
        );

        AggregatedResource {
            provider: Provider::Kubernetes,
            resource: resource.to_string(),
            metrics,
            requested_cpu_milli: requested.cpu_milli,
            requested_memory_gb: requested.memory_gb,
            optimal_cpu_milli: optimal.cpu_milli,
            optimal_memory_gb: optimal.memory_gb,
            cost_current_usd,
            cost_optimal_usd,
            cost_savings_usd: cost_current_usd - cost_optimal_usd,
            data_points: samples.len(),
        }
    }

    fn fix_actions(
        &self,
        resource: &AggregatedResource,
        priority: u32,
        config: &EngineConfig,
    ) -> Vec<FixAction> {
        let cpu = resource.cpu().copied();
        let memory = resource.memory().copied();
        let threshold = &config.fixes.threshold;

        // A persisted scan may carry a zero request for a measured dimension
        let mut requested_cpu = resource.requested_cpu_milli;
        if requested_cpu <= 0.0 {
            if let Some(stat) = cpu {
                requested_cpu = config.requests.infer_cpu(stat.p95);
            }
        }
        let mut requested_memory = resource.requested_memory_gb;
        if requested_memory <= 0.0 {
            if let Some(stat) = memory {
                requested_memory = config.requests.infer_memory(stat.p95);
            }
        }

        let dimensions = [
            Dimension {
                intent: Intent::RightsizeCpuRequest,
                label: "CPU",
                unit: "m",
                precision: 2,
                stat: cpu,
                requested: requested_cpu,
                optimal: resource.optimal_cpu_milli,
                scale_down_percent: threshold.cpu_scale_down_percent,
                scale_up_percent: threshold.cpu_scale_up_percent,
                price: CostModel::cpu_cost,
            },
            Dimension {
                intent: Intent::RightsizeMemoryRequest,
                label: "Memory",
                unit: "GB",
                precision: 3,
                stat: memory,
                requested: requested_memory,
                optimal: resource.optimal_memory_gb,
                scale_down_percent: threshold.memory_scale_down_percent,
                scale_up_percent: threshold.memory_scale_up_percent,
                price: CostModel::memory_cost,
            },
        ];

        generate_actions(resource, &dimensions, priority, config)
    }
}
