use regex::Regex;
use std::sync::LazyLock;

use super::command::{CommandRunner, ToolOutput};
use super::AdapterError;
use crate::models::{Finding, Severity, Stage};

// [template-id] [protocol] [severity] https://target [extracted...]
static FINDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s+\[([^\]]+)\]\s+\[([^\]]+)\]\s+(\S+)(?:\s+(.+))?$")
        .expect("nuclei line regex")
});

pub struct VulnScanAdapter {
    runner: CommandRunner,
}

impl VulnScanAdapter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
        let output = self
            .runner
            .run(&["-u", url, "-silent", "-nc"])
            .await?;
        parse_findings(&output, url)
    }
}

fn parse_findings(output: &ToolOutput, subject: &str) -> Result<Vec<Finding>, AdapterError> {
    if output.line_count() == 0 {
        return Ok(Vec::new());
    }
    let findings: Vec<Finding> = output
        .lines()
        .filter_map(|line| {
            let caps = FINDING_RE.captures(line)?;
            let severity = Severity::parse(&caps[3]).unwrap_or(Severity::Info);
            Some(Finding::new(Stage::VulnScan, subject, severity, line))
        })
        .collect();
    if findings.is_empty() {
        return Err(AdapterError::MalformedOutput {
            detail: "no template match lines in scanner output".to_string(),
        });
    }
    Ok(findings)
}
