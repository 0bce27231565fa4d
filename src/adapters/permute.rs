use super::command::{CommandRunner, ToolOutput};
use super::AdapterError;
use crate::models::{Host, Target};

pub struct PermuteAdapter {
    runner: CommandRunner,
}

impl PermuteAdapter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn generate(&self, target: &Target) -> Result<Vec<Host>, AdapterError> {
        let input = format!("{}\n", target);
        let output = self
            .runner
            .run_with_stdin(&["generate", "--silent"], Some(&input))
            .await?;
        parse_candidates(&output)
    }
}

fn parse_candidates(output: &ToolOutput) -> Result<Vec<Host>, AdapterError> {
    if output.line_count() == 0 {
        return Ok(Vec::new());
    }
    let hosts: Vec<Host> = output.lines().filter_map(Host::parse).collect();
    if hosts.is_empty() {
        return Err(AdapterError::MalformedOutput {
            detail: "no hostname lines in generator output".to_string(),
        });
    }
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candidate_hosts() {
        let output = ToolOutput::new("dev.example.test\nstaging.example.test\n".to_string());
        let hosts = parse_candidates(&output).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].as_str(), "dev.example.test");
    }

    #[test]
    fn empty_output_means_no_candidates() {
        let output = ToolOutput::new(String::new());
        assert!(parse_candidates(&output).unwrap().is_empty());
    }

    #[test]
    fn garbage_only_output_is_malformed() {
        let output = ToolOutput::new("!!! not a hostname !!!\n??? ???\n".to_string());
        let err = parse_candidates(&output).unwrap_err();
        assert!(matches!(err, AdapterError::MalformedOutput { .. }));
    }

    #[test]
    fn garbage_lines_are_skipped_when_real_hosts_exist() {
        let output = ToolOutput::new("dev.example.test\n<<banner>>\n".to_string());
        let hosts = parse_candidates(&output).unwrap();
        assert_eq!(hosts.len(), 1);
    }
}
