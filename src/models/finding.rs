use serde::{Deserialize, Serialize};
use std::fmt;

use super::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn numeric_value(&self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "info" | "informational" | "unknown" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub stage: Stage,
    pub subject: String,
    pub severity: Severity,
    pub detail: String,
}

impl Finding {
    pub fn new(
        stage: Stage,
        subject: impl Into<String>,
        severity: Severity,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            subject: subject.into(),
            severity,
            detail: detail.into(),
        }
    }

    pub fn key(&self) -> FindingKey {
        FindingKey {
            stage: self.stage,
            subject: self.subject.clone(),
            detail_hash: fnv1a(&self.detail),
        }
    }
}

// Dedup identity must be stable across retries and across process restarts,
// so the detail hash cannot use the randomly-keyed std hasher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindingKey {
    pub stage: Stage,
    pub subject: String,
    pub detail_hash: u64,
}

fn fnv1a(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
        assert_eq!(Severity::parse("unknown"), Some(Severity::Info));
        assert_eq!(Severity::parse("bogus"), None);
    }

    #[test]
    fn key_is_stable_for_identical_findings() {
        let a = Finding::new(Stage::VulnScan, "https://a.example.test", Severity::High, "cve-x");
        let b = Finding::new(Stage::VulnScan, "https://a.example.test", Severity::High, "cve-x");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_distinguishes_stage_subject_and_detail() {
        let base = Finding::new(Stage::VulnScan, "https://a.example.test", Severity::High, "cve-x");
        let other_stage = Finding::new(Stage::XssScan, "https://a.example.test", Severity::High, "cve-x");
        let other_subject = Finding::new(Stage::VulnScan, "https://b.example.test", Severity::High, "cve-x");
        let other_detail = Finding::new(Stage::VulnScan, "https://a.example.test", Severity::High, "cve-y");
        assert_ne!(base.key(), other_stage.key());
        assert_ne!(base.key(), other_subject.key());
        assert_ne!(base.key(), other_detail.key());
    }

    #[test]
    fn fnv_hash_is_deterministic() {
        assert_eq!(fnv1a("open port 22/tcp"), fnv1a("open port 22/tcp"));
        assert_ne!(fnv1a("open port 22/tcp"), fnv1a("open port 80/tcp"));
    }
}
