use std::env;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::AdapterError;

pub fn find_program(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
}

impl ToolOutput {
    pub fn new(stdout: String) -> Self {
        Self { stdout }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}

#[derive(Debug, Clone)]
pub struct CommandRunner {
    name: String,
    program: PathBuf,
    timeout: Duration,
}

impl CommandRunner {
    pub fn resolve(name: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let program = find_program(name).ok_or_else(|| AdapterError::ToolMissing {
            name: name.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            program,
            timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, args: &[&str]) -> Result<ToolOutput, AdapterError> {
        self.run_with_stdin(args, None).await
    }

    // Arguments are passed as an exec vector, never through a shell, so
    // tool-derived hostnames cannot smuggle in extra commands.
    pub async fn run_with_stdin(
        &self,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<ToolOutput, AdapterError> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AdapterError::ToolMissing {
                    name: self.name.clone(),
                }
            } else {
                AdapterError::Spawn {
                    detail: e.to_string(),
                }
            }
        })?;

        if let Some(data) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(data.as_bytes())
                    .await
                    .map_err(|e| AdapterError::Spawn {
                        detail: e.to_string(),
                    })?;
            }
        }

        let secs = self.timeout.as_secs();
        // Dropping the wait future on deadline kills the child via kill_on_drop.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(AdapterError::Spawn {
                    detail: e.to_string(),
                });
            }
            Err(_) => return Err(AdapterError::Timeout { secs }),
        };

        if !output.status.success() {
            return Err(AdapterError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ToolOutput::new(
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_not_found() {
        assert!(find_program("scoutd-test-no-such-binary-zzz").is_none());
    }

    #[test]
    fn resolve_reports_tool_missing() {
        let err = CommandRunner::resolve("scoutd-test-no-such-binary-zzz", Duration::from_secs(1))
            .err()
            .map(|e| matches!(e, AdapterError::ToolMissing { .. }));
        assert_eq!(err, Some(true));
    }

    #[test]
    fn tool_output_skips_blank_lines() {
        let output = ToolOutput::new("a.example.test\n\n  b.example.test  \n".to_string());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec!["a.example.test", "b.example.test"]);
        assert_eq!(output.line_count(), 2);
    }
}
