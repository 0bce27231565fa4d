use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Finding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discovery,
    HttpProbe,
    VulnScan,
    XssScan,
    PortScan,
    PathScrape,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Discovery,
        Stage::HttpProbe,
        Stage::VulnScan,
        Stage::XssScan,
        Stage::PortScan,
        Stage::PathScrape,
        Stage::Report,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Discovery => "discovery",
            Stage::HttpProbe => "http_probe",
            Stage::VulnScan => "vuln_scan",
            Stage::XssScan => "xss_scan",
            Stage::PortScan => "port_scan",
            Stage::PathScrape => "path_scrape",
            Stage::Report => "report",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Discovery => "Subdomain discovery",
            Stage::HttpProbe => "HTTP probing",
            Stage::VulnScan => "Vulnerability scan",
            Stage::XssScan => "XSS scan",
            Stage::PortScan => "Port scan",
            Stage::PathScrape => "Path scrape",
            Stage::Report => "Report",
        }
    }

    pub fn artifact_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Complete,
    PartiallyFailed,
    Failed,
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageStatus::Complete | StageStatus::PartiallyFailed | StageStatus::Failed
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Complete => "complete",
            StageStatus::PartiallyFailed => "partially failed",
            StageStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    NonZeroExit { status: i32, stderr: String },
    Timeout { secs: u64 },
    MalformedOutput { detail: String },
    Spawn { detail: String },
    Cancelled,
    EmptyInput,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NonZeroExit { status, stderr } => {
                if stderr.is_empty() {
                    write!(f, "exit status {}", status)
                } else {
                    write!(f, "exit status {}: {}", status, stderr)
                }
            }
            FailureReason::Timeout { secs } => write!(f, "timed out after {}s", secs),
            FailureReason::MalformedOutput { detail } => {
                write!(f, "unparseable output: {}", detail)
            }
            FailureReason::Spawn { detail } => write!(f, "spawn failed: {}", detail),
            FailureReason::Cancelled => write!(f, "cancelled before dispatch"),
            FailureReason::EmptyInput => write!(f, "no inputs from upstream stage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub key: String,
    pub reason: FailureReason,
}

impl ItemFailure {
    pub fn new(key: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            key: key.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    pub attempted: usize,
    pub findings: Vec<Finding>,
    pub failures: Vec<ItemFailure>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageResult {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            attempted: 0,
            findings: Vec::new(),
            failures: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.failures.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_unique() {
        let mut names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Stage::ALL.len());
    }

    #[test]
    fn terminal_statuses() {
        assert!(StageStatus::Complete.is_terminal());
        assert!(StageStatus::PartiallyFailed.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
    }
}
