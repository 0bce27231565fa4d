use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)+$")
        .expect("domain regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid target domain: {0:?}")]
pub struct InvalidTarget(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn parse(input: &str) -> Result<Self, InvalidTarget> {
        let normalized = input.trim().trim_end_matches('.').to_lowercase();
        if normalized.is_empty() || !DOMAIN_RE.is_match(&normalized) {
            return Err(InvalidTarget(input.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
