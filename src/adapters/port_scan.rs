use regex::Regex;
use std::sync::LazyLock;

use super::command::{CommandRunner, ToolOutput};
use super::AdapterError;
use crate::models::{Finding, Host, Severity, Stage};

// 22/tcp  open  ssh  OpenSSH 8.9p1
static PORT_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,5})/(tcp|udp)\s+open\s+(\S+)(?:\s+(.+))?$").expect("port row regex")
});

pub struct PortScanAdapter {
    runner: CommandRunner,
}

impl PortScanAdapter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn scan(&self, host: &Host) -> Result<Vec<Finding>, AdapterError> {
        let output = self
            .runner
            .run(&["-sV", "--script", "vuln", host.as_str()])
            .await?;
        Ok(parse_findings(&output, host))
    }
}

fn parse_findings(output: &ToolOutput, host: &Host) -> Vec<Finding> {
    let mut findings = Vec::new();
    for line in output.lines() {
        if let Some(caps) = PORT_ROW_RE.captures(line) {
            let service = caps
                .get(4)
                .map(|version| format!("{} ({})", &caps[3], version.as_str().trim()))
                .unwrap_or_else(|| caps[3].to_string());
            findings.push(Finding::new(
                Stage::PortScan,
                host.as_str(),
                Severity::Info,
                format!("open port {}/{}: {}", &caps[1], &caps[2], service),
            ));
        } else if line.contains("VULNERABLE") {
            findings.push(Finding::new(
                Stage::PortScan,
                host.as_str(),
                Severity::High,
                line.trim_start_matches('|').trim(),
            ));
        }
    }
    findings
}
