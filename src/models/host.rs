use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Host(String);

impl Host {
    // Hostnames come from tool output over attacker-influenced data; anything
    // outside the hostname charset is dropped rather than passed to a tool.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().trim_end_matches('.').to_lowercase();
        if normalized.is_empty() || normalized.len() > 253 {
            return None;
        }
        let valid = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid || normalized.starts_with('.') || normalized.contains("..") {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn from_url(url: &str) -> Option<Self> {
        let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
        let host = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or(rest)
            .split(':')
            .next()
            .unwrap_or(rest);
        Self::parse(host)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEndpoint {
    pub url: String,
    pub status: u16,
    pub redirects: usize,
    pub title: Option<String>,
}

impl LiveEndpoint {
    pub fn new(url: impl Into<String>, status: u16, redirects: usize, title: Option<String>) -> Self {
        let url: String = url.into();
        let url = url.trim().trim_end_matches('/').to_string();
        Self {
            url,
            status,
            redirects,
            title,
        }
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("HTTP {}", self.status)];
        if self.redirects > 0 {
            parts.push(format!("{} redirects", self.redirects));
        }
        if let Some(title) = &self.title {
            if !title.is_empty() {
                parts.push(format!("title: {}", title));
            }
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_hostname() {
        let host = Host::parse("  WWW.Example.TEST.  ").unwrap();
        assert_eq!(host.as_str(), "www.example.test");
    }

    #[test]
    fn rejects_garbage_lines() {
        assert!(Host::parse("").is_none());
        assert!(Host::parse("host with spaces").is_none());
        assert!(Host::parse("host;id").is_none());
        assert!(Host::parse(".leading.dot").is_none());
        assert!(Host::parse("double..dot").is_none());
    }

    #[test]
    fn extracts_host_from_url() {
        let host = Host::from_url("https://A.Example.test:8443/admin?q=1").unwrap();
        assert_eq!(host.as_str(), "a.example.test");
        assert_eq!(Host::from_url("a.example.test").unwrap().as_str(), "a.example.test");
    }

    #[test]
    fn endpoint_summary_includes_metadata() {
        let ep = LiveEndpoint::new("https://a.example.test/", 200, 2, Some("Login".into()));
        assert_eq!(ep.url, "https://a.example.test");
        assert_eq!(ep.summary(), "HTTP 200, 2 redirects, title: Login");

        let bare = LiveEndpoint::new("https://b.example.test", 404, 0, None);
        assert_eq!(bare.summary(), "HTTP 404");
    }
}
