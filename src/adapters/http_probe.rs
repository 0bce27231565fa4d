use serde::Deserialize;

use super::command::{CommandRunner, ToolOutput};
use super::AdapterError;
use crate::models::{Host, LiveEndpoint};

pub struct HttpProbeAdapter {
    runner: CommandRunner,
}

#[derive(Deserialize)]
struct ProbeRecord {
    url: String,
    #[serde(default)]
    status_code: u16,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    chain_status_codes: Option<Vec<u16>>,
}

impl HttpProbeAdapter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn probe(&self, host: &Host) -> Result<Option<LiveEndpoint>, AdapterError> {
        self.probe_url(host.as_str()).await
    }

    pub async fn probe_path(
        &self,
        url: &str,
        path: &str,
    ) -> Result<Option<LiveEndpoint>, AdapterError> {
        let composed = compose_url(url, path);
        self.probe_url(&composed).await
    }

    async fn probe_url(&self, input: &str) -> Result<Option<LiveEndpoint>, AdapterError> {
        let output = self
            .runner
            .run(&["-u", input, "-silent", "-follow-redirects", "-json"])
            .await?;
        parse_probe(&output)
    }
}

pub fn compose_url(url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        url.trim_end_matches('/'),
        urlencoding::encode(path.trim_start_matches('/'))
    )
}

fn parse_probe(output: &ToolOutput) -> Result<Option<LiveEndpoint>, AdapterError> {
    // The prober emits nothing for an unreachable host; that is a clean miss.
    let Some(line) = output.lines().next() else {
        return Ok(None);
    };
    let record: ProbeRecord =
        serde_json::from_str(line).map_err(|e| AdapterError::MalformedOutput {
            detail: format!("probe record: {}", e),
        })?;
    // The chain includes the final response; hops are everything before it.
    let redirects = record
        .chain_status_codes
        .map(|chain| chain.len().saturating_sub(1))
        .unwrap_or(0);
    Ok(Some(LiveEndpoint::new(
        record.url,
        record.status_code,
        redirects,
        record.title.filter(|t| !t.is_empty()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_live_probe_record() {
        let output = ToolOutput::new(
            r#"{"url":"https://a.example.test","status_code":200,"title":"Example","chain_status_codes":[301,200]}"#
                .to_string(),
        );
        let endpoint = parse_probe(&output).unwrap().unwrap();
        assert_eq!(endpoint.url, "https://a.example.test");
        assert_eq!(endpoint.status, 200);
        assert_eq!(endpoint.redirects, 1);
        assert_eq!(endpoint.title.as_deref(), Some("Example"));
    }

    #[test]
    fn silent_probe_is_a_clean_miss() {
        let output = ToolOutput::new(String::new());
        assert!(parse_probe(&output).unwrap().is_none());
    }

    #[test]
    fn non_json_probe_output_is_malformed() {
        let output = ToolOutput::new("https://a.example.test [200] [Example]".to_string());
        assert!(matches!(
            parse_probe(&output).unwrap_err(),
            AdapterError::MalformedOutput { .. }
        ));
    }

    #[test]
    fn composes_scrape_urls_safely() {
        assert_eq!(
            compose_url("https://a.example.test/", ".env"),
            "https://a.example.test/.env"
        );
        assert_eq!(
            compose_url("https://a.example.test", "backup zip?"),
            "https://a.example.test/backup%20zip%3F"
        );
    }
}
