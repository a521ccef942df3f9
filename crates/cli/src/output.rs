//! Output formatting utilities

use advisor_lib::{apply::ApplyStatus, RiskLevel, Verdict};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or `value` as JSON
pub fn print_rows<T: Tabled, V: Serialize>(rows: &[T], value: &V, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(value),
    }
}

pub fn print_json<V: Serialize>(value: &V) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to render JSON: {}", e)),
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format milli-cores, switching to cores from 1000m
pub fn format_cpu(milli: f64) -> String {
    if milli >= 1000.0 {
        format!("{:.2}", milli / 1000.0)
    } else {
        format!("{:.0}m", milli)
    }
}

/// Format gigabytes, switching to Mi below 1 GB
pub fn format_memory(gb: f64) -> String {
    if gb >= 1.0 {
        format!("{:.2}Gi", gb)
    } else {
        format!("{:.0}Mi", gb * 1024.0)
    }
}

/// Format a monthly USD amount
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn color_verdict(verdict: Verdict) -> String {
    let text = verdict.as_str();
    match verdict {
        Verdict::Apply => text.green().to_string(),
        Verdict::Defer => text.yellow().to_string(),
        Verdict::Skip => text.dimmed().to_string(),
    }
}

pub fn color_risk(risk: RiskLevel) -> String {
    let text = risk.as_str();
    match risk {
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Medium => text.yellow().to_string(),
        RiskLevel::High => text.red().to_string(),
    }
}

pub fn color_apply_status(status: ApplyStatus) -> String {
    let text = status.to_string();
    match status {
        ApplyStatus::Modified => text.green().to_string(),
        ApplyStatus::Unchanged => text.blue().to_string(),
        ApplyStatus::Failed => text.red().to_string(),
    }
}
