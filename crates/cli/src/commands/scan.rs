//! Scan command: aggregate samples into a cost report

use advisor_lib::{
    parse_json, run_scan, Allocation, EngineConfig, MetricSample, ScanReport, ScanRequest,
    StructuredLogger,
};
use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabled::Tabled;

use super::{read_file, write_json};
use crate::output::{
    format_cpu, format_currency, format_memory, print_rows, print_success, print_warning,
    OutputFormat,
};

pub const SCAN_FILE: &str = "scan.json";

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "CPU Req")]
    cpu_requested: String,
    #[tabled(rename = "CPU Opt")]
    cpu_optimal: String,
    #[tabled(rename = "Mem Req")]
    memory_requested: String,
    #[tabled(rename = "Mem Opt")]
    memory_optimal: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Savings")]
    savings: String,
    #[tabled(rename = "Waste")]
    waste: String,
}

/// Load the samples (and optional ground truth) a scan runs on
pub fn load_request(metrics: &Path, requests: Option<&Path>) -> Result<ScanRequest> {
    let samples: Vec<MetricSample> = parse_json("metrics file", &read_file(metrics)?)?;
    let actual_requests: BTreeMap<String, Allocation> = match requests {
        Some(path) => parse_json("requests file", &read_file(path)?)?,
        None => BTreeMap::new(),
    };
    Ok(ScanRequest {
        metrics: samples,
        actual_requests,
    })
}

pub fn run(
    metrics: &Path,
    requests: Option<&Path>,
    out_dir: &Path,
    engine: &EngineConfig,
    format: OutputFormat,
) -> Result<PathBuf> {
    let request = load_request(metrics, requests)?;
    let report = run_scan(&request, engine);
    StructuredLogger::new("cli").log_scan(request.metrics.len(), &report);

    let path = write_json(out_dir, SCAN_FILE, &report)?;
    print_report(&report, format);
    if let OutputFormat::Table = format {
        print_success(&format!("Scan written to {}", path.display()));
    }
    Ok(path)
}

fn print_report(report: &ScanReport, format: OutputFormat) {
    let rows: Vec<ResourceRow> = report
        .resources
        .iter()
        .map(|r| {
            let a = &r.aggregated;
            ResourceRow {
                resource: a.resource.clone(),
                provider: a.provider.to_string(),
                samples: a.data_points,
                cpu_requested: format_cpu(a.requested_cpu_milli),
                cpu_optimal: format_cpu(a.optimal_cpu_milli),
                memory_requested: format_memory(a.requested_memory_gb),
                memory_optimal: format_memory(a.optimal_memory_gb),
                current: format_currency(a.cost_current_usd),
                savings: format_currency(a.cost_savings_usd),
                waste: format!("{:.1}%", r.waste_percentage),
            }
        })
        .collect();

    print_rows(&rows, report, format);

    if let OutputFormat::Table = format {
        let summary = &report.summary;
        if summary.resources_analyzed == 0 {
            print_warning("No supported resources in the metrics file");
            return;
        }
        println!();
        println!(
            "{} {} / month, optimal {}",
            "Current cost:".bold(),
            format_currency(summary.total_current_cost_usd),
            format_currency(summary.total_optimal_cost_usd).green()
        );
        println!(
            "{} {}",
            "Potential savings:".bold(),
            format_currency(summary.total_potential_savings_usd).green().bold()
        );
        if !summary.top_offenders.is_empty() {
            println!("Top offenders: {}", summary.top_offenders.join(", ").cyan());
        }
    }
}
