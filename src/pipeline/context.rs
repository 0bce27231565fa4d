use std::path::PathBuf;
use std::time::Duration;

use crate::executor::CancelToken;
use crate::models::Target;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_PORT_CONCURRENCY: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SCRAPE_PATHS: [&str; 5] = ["admin", "login", "backup.zip", ".env", "config.php"];

// Everything one pipeline execution needs, passed explicitly; there is no
// process-wide configuration.
pub struct RunContext {
    pub target: Target,
    pub dir: PathBuf,
    pub concurrency: usize,
    pub port_concurrency: usize,
    pub timeout: Duration,
    pub force: bool,
    pub scrape_paths: Vec<String>,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new(target: Target, output: Option<PathBuf>) -> Self {
        let dir = output.unwrap_or_else(|| PathBuf::from(format!("results_{}", target)));
        Self {
            target,
            dir,
            concurrency: DEFAULT_CONCURRENCY,
            port_concurrency: DEFAULT_PORT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            force: false,
            scrape_paths: DEFAULT_SCRAPE_PATHS.map(String::from).to_vec(),
            cancel: CancelToken::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_directory_is_per_target() {
        let target = Target::parse("example.test").unwrap();
        let ctx = RunContext::new(target, None);
        assert_eq!(ctx.dir, PathBuf::from("results_example.test"));
        assert_eq!(ctx.concurrency, DEFAULT_CONCURRENCY);
        assert!(ctx.port_concurrency < ctx.concurrency);
    }

    #[test]
    fn explicit_output_directory_wins() {
        let target = Target::parse("example.test").unwrap();
        let ctx = RunContext::new(target, Some(PathBuf::from("/tmp/run")));
        assert_eq!(ctx.dir, PathBuf::from("/tmp/run"));
    }
}
