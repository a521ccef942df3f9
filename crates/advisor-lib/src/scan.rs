//! Sample grouping and the scan report
//!
//! Samples are grouped per (provider, resource) and handed to the
//! provider's family. Groups are visited in sorted order so identical
//! input always serializes identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::models::{AggregatedResource, Allocation, MetricSample, Provider};

/// Samples plus optional ground-truth requests keyed by resource name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    pub metrics: Vec<MetricSample>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actual_requests: BTreeMap<String, Allocation>,
}

/// One resource in a scan report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResource {
    #[serde(flatten)]
    pub aggregated: AggregatedResource,
    /// Savings as a share of current cost, 0 when nothing is spent
    pub waste_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub resources_analyzed: usize,
    pub total_current_cost_usd: f64,
    pub total_optimal_cost_usd: f64,
    pub total_potential_savings_usd: f64,
    pub top_offenders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub resources: Vec<ScanResource>,
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Aggregated resources in report order, for a later fix pass
    pub fn into_aggregated(self) -> Vec<AggregatedResource> {
        self.resources.into_iter().map(|r| r.aggregated).collect()
    }
}

/// How many resources are named in the summary
pub const TOP_OFFENDERS: usize = 3;

/// Group samples and aggregate each supported (provider, resource) pair
pub fn aggregate_samples(
    samples: &[MetricSample],
    actual_requests: &BTreeMap<String, Allocation>,
    config: &EngineConfig,
) -> Vec<AggregatedResource> {
    let mut groups: BTreeMap<(Provider, &str), Vec<&MetricSample>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry((sample.provider, sample.resource.as_str()))
            .or_default()
            .push(sample);
    }

    let mut out = Vec::with_capacity(groups.len());
    for ((provider, resource), group) in groups {
        let Some(family) = provider.family() else {
            warn!(
                provider = %provider,
                resource = %resource,
                samples = group.len(),
                "Skipping samples for unsupported provider"
            );
            continue;
        };
        out.push(family.aggregate(resource, &group, actual_requests.get(resource), config));
    }

    debug!(samples = samples.len(), resources = out.len(), "Aggregated samples");
    out
}

/// Render aggregated resources as a report sorted by savings
pub fn build_scan_report(aggregated: Vec<AggregatedResource>) -> ScanReport {
    let total_current: f64 = aggregated.iter().map(|a| a.cost_current_usd).sum();
    let total_optimal: f64 = aggregated.iter().map(|a| a.cost_optimal_usd).sum();

    let mut resources: Vec<ScanResource> = aggregated
        .into_iter()
        .map(|aggregated| {
            let waste_percentage = if aggregated.cost_current_usd > 0.0 {
                aggregated.cost_savings_usd / aggregated.cost_current_usd * 100.0
            } else {
                0.0
            };
            ScanResource {
                aggregated,
                waste_percentage,
            }
        })
        .collect();

    // sort_by is stable, equal savings keep grouping order
    resources.sort_by(|a, b| {
        b.aggregated
            .cost_savings_usd
            .total_cmp(&a.aggregated.cost_savings_usd)
    });

    let top_offenders = resources
        .iter()
        .take(TOP_OFFENDERS)
        .map(|r| r.aggregated.resource.clone())
        .collect();

    ScanReport {
        summary: ScanSummary {
            resources_analyzed: resources.len(),
            total_current_cost_usd: total_current,
            total_optimal_cost_usd: total_optimal,
            total_potential_savings_usd: total_current - total_optimal,
            top_offenders,
        },
        resources,
    }
}

pub fn run_scan(request: &ScanRequest, config: &EngineConfig) -> ScanReport {
    build_scan_report(aggregate_samples(
        &request.metrics,
        &request.actual_requests,
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::parse_json;

    fn request(json: &str) -> ScanRequest {
        parse_json("scan request", json.as_bytes()).unwrap()
    }

    fn k8s(resource: &str, cpu: f64, mem: f64) -> String {
        format!(
            r#"{{"provider":"kubernetes","resource":"{}","timestamp":1,
                "resource_metrics":{{"k8s_resource":{{"cpu_milli":{},"memory_gb":{}}}}}}}"#,
            resource, cpu, mem
        )
    }

    #[test]
    fn test_groups_by_resource_and_skips_unsupported() {
        let json = format!(
            r#"{{"metrics":[{},{},{},{{"provider":"vercel","resource":"site"}}]}}"#,
            k8s("b", 100.0, 1.0),
            k8s("a", 200.0, 2.0),
            k8s("b", 300.0, 1.0),
        );
        let req = request(&json);
        let agg = aggregate_samples(&req.metrics, &req.actual_requests, &EngineConfig::default());

        let names: Vec<_> = agg.iter().map(|a| a.resource.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(agg[1].data_points, 2);
    }

    #[test]
    fn test_report_sorted_by_savings_with_top_offenders() {
        let json = format!(
            r#"{{"metrics":[{},{},{},{}]}}"#,
            k8s("small", 10.0, 0.1),
            k8s("huge", 5000.0, 8.0),
            k8s("medium", 500.0, 1.0),
            k8s("large", 1000.0, 4.0),
        );
        let report = run_scan(&request(&json), &EngineConfig::default());

        assert_eq!(report.summary.resources_analyzed, 4);
        assert_eq!(report.summary.top_offenders, vec!["huge", "large", "medium"]);
        let savings: Vec<f64> = report
            .resources
            .iter()
            .map(|r| r.aggregated.cost_savings_usd)
            .collect();
        assert!(savings.windows(2).all(|w| w[0] >= w[1]));
        assert!(
            (report.summary.total_potential_savings_usd
                - (report.summary.total_current_cost_usd - report.summary.total_optimal_cost_usd))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_ground_truth_is_applied_per_resource() {
        let json = format!(
            r#"{{"metrics":[{}],"actual_requests":{{"api":{{"cpu_milli":1000,"memory_gb":4}}}}}}"#,
            k8s("api", 100.0, 1.0)
        );
        let report = run_scan(&request(&json), &EngineConfig::default());
        let api = &report.resources[0].aggregated;
        assert_eq!(api.requested(), Allocation::new(1000.0, 4.0));
        // 1000m/4GB costs 7.2576, optimal 120m/1.2GB costs 0.88128
        assert!((report.resources[0].waste_percentage - 87.857_142_857).abs() < 1e-6);
    }

    #[test]
    fn test_report_json_round_trips_to_aggregated() {
        let json = format!(r#"{{"metrics":[{}]}}"#, k8s("api", 100.0, 1.0));
        let report = run_scan(&request(&json), &EngineConfig::default());
        let encoded = serde_json::to_value(&report).unwrap();

        assert!(encoded["resources"][0]["requested_cpu_milli"].is_number());
        assert!(encoded["resources"][0]["waste_percentage"].is_number());

        let decoded: ScanReport = serde_json::from_value(encoded).unwrap();
        let before = report.into_aggregated();
        let after = decoded.into_aggregated();
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0].resource, before[0].resource);
        assert_eq!(after[0].metrics.keys().collect::<Vec<_>>(), vec!["cpu_milli", "memory_gb"]);
        assert!((after[0].cost_savings_usd - before[0].cost_savings_usd).abs() < 1e-12);
    }

    #[test]
    fn test_empty_scan() {
        let report = run_scan(&ScanRequest::default(), &EngineConfig::default());
        assert!(report.resources.is_empty());
        assert!(report.summary.top_offenders.is_empty());
        assert_eq!(report.summary.total_current_cost_usd, 0.0);
    }

    #[test]
    fn test_unknown_provider_is_malformed() {
        let err = parse_json::<ScanRequest>(
            "scan request",
            br#"{"metrics":[{"provider":"mainframe","resource":"x"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("malformed scan request"));
    }
}
