mod command;
mod http_probe;
mod permute;
mod port_scan;
mod resolve;
mod toolbox;
mod vuln_scan;
mod xss_scan;

pub use command::{CommandRunner, ToolOutput, find_program};
pub use http_probe::{HttpProbeAdapter, compose_url};
pub use permute::PermuteAdapter;
pub use port_scan::PortScanAdapter;
pub use resolve::ResolveAdapter;
pub use toolbox::{CommandToolbox, MissingTools, ScanTools};
pub use vuln_scan::VulnScanAdapter;
pub use xss_scan::XssScanAdapter;

use thiserror::Error;

use crate::models::FailureReason;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{name} is not installed or not in PATH")]
    ToolMissing { name: String },

    #[error("exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("unparseable output: {detail}")]
    MalformedOutput { detail: String },

    #[error("failed to spawn: {detail}")]
    Spawn { detail: String },
}

impl From<AdapterError> for FailureReason {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::ToolMissing { name } => FailureReason::Spawn {
                detail: format!("{} is not installed", name),
            },
            AdapterError::NonZeroExit { status, stderr } => {
                FailureReason::NonZeroExit { status, stderr }
            }
            AdapterError::Timeout { secs } => FailureReason::Timeout { secs },
            AdapterError::MalformedOutput { detail } => FailureReason::MalformedOutput { detail },
            AdapterError::Spawn { detail } => FailureReason::Spawn { detail },
        }
    }
}
