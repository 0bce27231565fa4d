use super::command::{CommandRunner, ToolOutput};
use super::AdapterError;
use crate::models::Host;

pub struct ResolveAdapter {
    runner: CommandRunner,
}

impl ResolveAdapter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn resolve(&self, candidates: &[Host]) -> Result<Vec<Host>, AdapterError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let mut input = String::new();
        for host in candidates {
            input.push_str(host.as_str());
            input.push('\n');
        }
        let output = self
            .runner
            .run_with_stdin(&["-silent"], Some(&input))
            .await?;
        parse_resolved(&output)
    }
}

fn parse_resolved(output: &ToolOutput) -> Result<Vec<Host>, AdapterError> {
    // Resolver silence is a valid answer: nothing resolved.
    if output.line_count() == 0 {
        return Ok(Vec::new());
    }
    let hosts: Vec<Host> = output.lines().filter_map(Host::parse).collect();
    if hosts.is_empty() {
        return Err(AdapterError::MalformedOutput {
            detail: "no hostname lines in resolver output".to_string(),
        });
    }
    Ok(hosts)
}
