use super::command::{CommandRunner, ToolOutput};
use super::AdapterError;
use crate::models::{Finding, Severity, Stage};

pub struct XssScanAdapter {
    runner: CommandRunner,
}

impl XssScanAdapter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
        let output = self
            .runner
            .run(&["url", url, "--silence", "--no-color"])
            .await?;
        Ok(parse_findings(&output, url))
    }
}

// Only proof-of-concept and verified lines count as findings; the scanner
// interleaves them with progress chatter even in silent mode.
fn parse_findings(output: &ToolOutput, subject: &str) -> Vec<Finding> {
    output
        .lines()
        .filter(|line| line.starts_with("[POC]") || line.starts_with("[V]"))
        .map(|line| {
            let severity = if line.starts_with("[V]") {
                Severity::Critical
            } else {
                Severity::High
            };
            Finding::new(Stage::XssScan, subject, severity, line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_poc_and_verified_lines() {
        let output = ToolOutput::new(
            "[*] scanning https://a.example.test\n\
             [POC][G][GET] https://a.example.test/?q=%3Cscript%3E\n\
             [V][GET] https://a.example.test/?q=%3Csvg+onload%3D1%3E\n\
             [I] finished\n"
                .to_string(),
        );
        let findings = parse_findings(&output, "https://a.example.test");
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[1].severity, Severity::Critical);
    }

    #[test]
    fn chatter_only_output_yields_no_findings() {
        let output = ToolOutput::new("[*] scanning\n[I] finished\n".to_string());
        assert!(parse_findings(&output, "https://a.example.test").is_empty());
    }
}
