//! Table rendering and cell styling

use clap::ValueEnum;
use colored::Colorize;
use kugap_lib::analysis::{factor_severity, Severity, Verdict};
use kugap_lib::quantity;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a titled table to stdout.
pub fn render_table<T: Tabled>(title: &str, rows: &[T]) {
    println!("{}", title.bold());
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Render rows as a plain (uncolored) markdown table.
pub fn markdown_table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows).with(Style::markdown()).to_string()
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Verdict label colored by how bad the gap is.
pub fn verdict_cell(verdict: Verdict) -> String {
    let label = verdict.label();
    match verdict {
        Verdict::MassivelyOverRequested => label.red().to_string(),
        Verdict::OverRequested => label.yellow().to_string(),
        Verdict::Bursting => label.magenta().to_string(),
        Verdict::Ok => label.green().to_string(),
    }
}

/// Over-request factor colored by severity tier; dimmed when no factor
/// can be computed.
pub fn factor_cell(req: i64, actual: i64) -> String {
    let text = quantity::format_factor(req, actual);
    match factor_severity(req, actual) {
        Some(Severity::Critical) => text.red().bold().to_string(),
        Some(Severity::High) => text.red().to_string(),
        Some(Severity::Medium) => text.yellow().to_string(),
        Some(Severity::Low) => text.green().to_string(),
        None => text.dimmed().to_string(),
    }
}

/// Dimmed marker for actual-usage cells whose metrics source failed.
pub fn na_cell(styled: bool) -> String {
    if styled {
        "N/A".dimmed().to_string()
    } else {
        "N/A".to_string()
    }
}
