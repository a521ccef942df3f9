//! Rightsize Advisor CLI
//!
//! Scans utilization samples into a cost report, then turns a saved scan
//! into a fix plan with ranked decisions, optionally editing manifests
//! and publishing results to a dashboard.

mod commands;
mod config;
mod dashboard;
mod output;

use advisor_lib::{FixStrategy, PlanOptions};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{fix, scan};

/// Rightsize Advisor CLI
#[derive(Parser)]
#[command(name = "rsz")]
#[command(author, version, about = "Rightsizing recommendations from utilization metrics", long_about = None)]
pub struct Cli {
    /// Path to a JSON config file (defaults to ~/.config/rsz/config.json)
    #[arg(long, env = "RSZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate metric samples into a cost and waste report
    Scan {
        /// JSON array of metric samples
        #[arg(long, short)]
        metrics: PathBuf,

        /// JSON object of actual requests keyed by resource name
        #[arg(long)]
        requests: Option<PathBuf>,

        /// Directory scan.json is written to
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Build a fix plan and ranked decisions from a saved scan
    Fix {
        /// Scan report written by `rsz scan`
        #[arg(long, short, default_value = "scan.json")]
        scan: PathBuf,

        /// Monthly budget target in USD
        #[arg(long)]
        budget: Option<f64>,

        /// Do not require approval for small plans
        #[arg(long)]
        auto_approve: bool,

        /// Sizing strategy (target or threshold)
        #[arg(long, env = "RSZ_FIX_STRATEGY")]
        strategy: Option<FixStrategy>,

        /// Edit workload manifests for actions marked apply
        #[arg(long)]
        apply: bool,

        /// Root searched for manifests when applying
        #[arg(long)]
        manifests: Option<PathBuf>,

        /// Dashboard base URL results are pushed to
        #[arg(long, env = "RSZ_DASHBOARD_URL")]
        dashboard_url: Option<String>,

        /// Directory plan.json and decisions.json are written to
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            metrics,
            requests,
            out,
        } => {
            let out_dir = config.output_dir(out);
            scan::run(
                &metrics,
                requests.as_deref(),
                &out_dir,
                &config.engine,
                cli.format,
            )?;
        }
        Commands::Fix {
            scan,
            budget,
            auto_approve,
            strategy,
            apply,
            manifests,
            dashboard_url,
            out,
        } => {
            if let Some(strategy) = strategy {
                config.engine.fixes.strategy = strategy;
            }
            let args = fix::FixArgs {
                scan,
                options: PlanOptions {
                    budget_target_usd: budget.unwrap_or(0.0),
                    auto_approve,
                },
                apply,
                manifests,
                dashboard_url: dashboard_url.or_else(|| config.dashboard_url.clone()),
                out_dir: config.output_dir(out),
            };
            fix::run(args, &config.engine, cli.format).await?;
        }
    }

    Ok(())
}
