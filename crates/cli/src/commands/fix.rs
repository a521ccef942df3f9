//! Fix command: plan, rank and optionally apply actions from a saved scan

use advisor_lib::{
    apply::{ApplyOutcome, ManifestApplier},
    assemble_plan, parse_json, rank_decisions, DecisionSummary, EngineConfig, FixPlan,
    PlanOptions, ScanReport, StructuredLogger,
};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing::warn;

use super::{read_file, write_json};
use crate::dashboard::{DashboardClient, DashboardUpdate, RepoInfo};
use crate::output::{
    color_apply_status, color_risk, color_verdict, format_currency, print_error, print_info,
    print_json, print_rows, print_success, OutputFormat,
};

pub const PLAN_FILE: &str = "plan.json";
pub const DECISIONS_FILE: &str = "decisions.json";

/// Everything the fix command needs besides the engine config
pub struct FixArgs {
    pub scan: PathBuf,
    pub options: PlanOptions,
    pub apply: bool,
    pub manifests: Option<PathBuf>,
    pub dashboard_url: Option<String>,
    pub out_dir: PathBuf,
}

#[derive(Tabled)]
struct DecisionRow {
    #[tabled(rename = "ID")]
    action_id: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Intent")]
    intent: String,
    #[tabled(rename = "Decision")]
    decision: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Savings")]
    savings: String,
    #[tabled(rename = "Priority")]
    priority: i32,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "ID")]
    action_id: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Serialize)]
struct FixOutput<'a> {
    plan: &'a FixPlan,
    decisions: &'a DecisionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<&'a [ApplyOutcome]>,
}

pub async fn run(args: FixArgs, engine: &EngineConfig, format: OutputFormat) -> Result<()> {
    let logger = StructuredLogger::new("cli");
    let report: ScanReport = parse_json("scan file", &read_file(&args.scan)?)?;

    let resources = report.clone().into_aggregated();
    let plan = assemble_plan(&resources, args.options, engine);
    logger.log_plan(&plan);
    let decisions = rank_decisions(&plan, &engine.decision);
    logger.log_decisions(&decisions);

    let plan_path = write_json(&args.out_dir, PLAN_FILE, &plan)?;
    let decisions_path = write_json(&args.out_dir, DECISIONS_FILE, &decisions)?;

    let outcomes = if args.apply {
        let root = args.manifests.clone().unwrap_or_else(|| PathBuf::from("."));
        let outcomes = apply(&root, &plan, &decisions, &logger);
        Some(outcomes)
    } else {
        None
    };

    match format {
        OutputFormat::Json => print_json(&FixOutput {
            plan: &plan,
            decisions: &decisions,
            applied: outcomes.as_deref(),
        }),
        OutputFormat::Table => {
            print_plan(&plan, &decisions);
            if let Some(outcomes) = &outcomes {
                print_outcomes(outcomes);
            }
            print_success(&format!(
                "Plan written to {}, decisions to {}",
                plan_path.display(),
                decisions_path.display()
            ));
        }
    }

    if let Some(base_url) = &args.dashboard_url {
        push_to_dashboard(base_url, report, decisions, &logger).await;
    }

    Ok(())
}

fn apply(
    root: &Path,
    plan: &FixPlan,
    decisions: &DecisionSummary,
    logger: &StructuredLogger,
) -> Vec<ApplyOutcome> {
    let applier = ManifestApplier::discover(root);
    if applier.manifests().is_empty() {
        warn!(root = %root.display(), "No workload manifests found");
    }
    let outcomes = applier.apply_decisions(plan, decisions);
    for outcome in &outcomes {
        logger.log_apply_outcome(outcome);
    }
    outcomes
}

fn print_plan(plan: &FixPlan, decisions: &DecisionSummary) {
    let rows: Vec<DecisionRow> = decisions
        .decisions
        .iter()
        .map(|d| DecisionRow {
            action_id: d.action_id.clone(),
            resource: d.resource.clone(),
            intent: d.intent.to_string(),
            decision: color_verdict(d.decision),
            risk: color_risk(d.risk_level),
            savings: format_currency(d.estimated_savings_usd),
            priority: d.priority,
        })
        .collect();
    print_rows(&rows, decisions, OutputFormat::Table);

    println!();
    println!("{}", plan.summary.bold());
    println!(
        "Monthly cost: {} -> {}",
        format_currency(plan.total_current_cost_usd),
        format_currency(plan.total_optimal_cost_usd).green()
    );
    if plan.budget_target_usd > 0.0 {
        let verdict = if plan.meets_budget {
            "meets".green()
        } else {
            "exceeds".red()
        };
        println!(
            "Budget {}: optimal cost {} the target",
            format_currency(plan.budget_target_usd),
            verdict
        );
    }
    if plan.requires_approval {
        print_info("This plan requires approval before it is applied");
    }
    println!("{}", decisions.summary);
}

fn print_outcomes(outcomes: &[ApplyOutcome]) {
    if outcomes.is_empty() {
        print_info("No actions to apply");
        return;
    }
    let rows: Vec<OutcomeRow> = outcomes
        .iter()
        .map(|o| OutcomeRow {
            action_id: o.action_id.clone(),
            resource: o.resource.clone(),
            file: o
                .file
                .as_ref()
                .map(|f| f.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: color_apply_status(o.status),
            detail: o.detail.clone(),
        })
        .collect();
    println!();
    print_rows(&rows, &outcomes, OutputFormat::Table);
}

/// Push failures are reported, never fatal
async fn push_to_dashboard(
    base_url: &str,
    report: ScanReport,
    decisions: DecisionSummary,
    logger: &StructuredLogger,
) {
    let client = match DashboardClient::from_env(base_url) {
        Ok(client) => client,
        Err(e) => {
            logger.log_dashboard_push(base_url, Some(&format!("{:#}", e)));
            print_error(&format!("Dashboard push skipped: {:#}", e));
            return;
        }
    };

    let update = DashboardUpdate::new(&RepoInfo::detect(), report, decisions);
    let url = client.submit_url().to_string();
    match client.send(&update).await {
        Ok(()) => {
            logger.log_dashboard_push(&url, None);
            print_success(&format!("Results pushed to {}", url));
        }
        Err(e) => {
            logger.log_dashboard_push(&url, Some(&format!("{:#}", e)));
            print_error(&format!("Dashboard push failed: {:#}", e));
        }
    }
}
