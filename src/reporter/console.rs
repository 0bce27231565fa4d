use colored::Colorize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::models::{Severity, Stage, StageResult, StageStatus};

pub struct ConsoleReporter;

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Items")]
    items: String,
    #[tabled(rename = "Findings")]
    findings: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print_stages(&self, results: &[StageResult]) {
        let rows: Vec<StageRow> = results
            .iter()
            .map(|result| {
                let status = match result.status {
                    StageStatus::Complete => result.status.to_string().green().to_string(),
                    StageStatus::PartiallyFailed => {
                        result.status.to_string().yellow().to_string()
                    }
                    StageStatus::Failed => result.status.to_string().red().to_string(),
                    _ => result.status.to_string().dimmed().to_string(),
                };
                StageRow {
                    stage: result.stage.label().to_string(),
                    status,
                    items: format!("{}/{}", result.succeeded(), result.attempted),
                    findings: result.findings.len(),
                    failed: result.failures.len(),
                }
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();

        println!("\n{}", table);
    }

    pub fn print_summary(&self, results: &[StageResult]) {
        let hosts = results
            .iter()
            .find(|r| r.stage == Stage::Discovery)
            .map(|r| r.findings.len())
            .unwrap_or(0);
        let live = results
            .iter()
            .find(|r| r.stage == Stage::HttpProbe)
            .map(|r| r.findings.len())
            .unwrap_or(0);

        println!("\n{}", "Summary".bold().underline());
        println!("{} hosts discovered, {} live over HTTP", hosts, live);

        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Info,
        ] {
            let count = results
                .iter()
                .filter(|r| r.stage != Stage::Discovery && r.stage != Stage::HttpProbe)
                .flat_map(|r| r.findings.iter())
                .filter(|f| f.severity == severity)
                .count();
            if count == 0 {
                continue;
            }
            let label = match severity {
                Severity::Critical => severity.to_string().red().bold().to_string(),
                Severity::High => severity.to_string().red().to_string(),
                Severity::Medium => severity.to_string().yellow().to_string(),
                Severity::Low => severity.to_string().blue().to_string(),
                Severity::Info => severity.to_string().cyan().to_string(),
            };
            println!("  {}: {}", label, count);
        }
        println!();
    }

    // Failures get their own section so "no findings for this host" is never
    // confused with "the scan of this host failed".
    pub fn print_failures(&self, results: &[StageResult]) {
        let failed: Vec<&StageResult> = results
            .iter()
            .filter(|r| !r.failures.is_empty())
            .collect();
        if failed.is_empty() {
            return;
        }

        println!("{}", "Failures".bold().underline());
        for result in failed {
            println!("\n[{}]", result.stage.label().yellow());
            for failure in &result.failures {
                println!("  {} {}", failure.key.white().bold(), failure.reason);
            }
        }
        println!();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
