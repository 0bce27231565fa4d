use std::time::Duration;
use thiserror::Error;

use super::command::CommandRunner;
use super::{
    AdapterError, HttpProbeAdapter, PermuteAdapter, PortScanAdapter, ResolveAdapter,
    VulnScanAdapter, XssScanAdapter,
};
use crate::models::{Finding, Host, LiveEndpoint, Target};

pub const REQUIRED_TOOLS: [&str; 6] = ["alterx", "dnsx", "httpx", "nuclei", "dalfox", "nmap"];

#[derive(Debug, Error)]
#[error("required tools missing: {}", .0.join(", "))]
pub struct MissingTools(pub Vec<String>);

// The seam between the pipeline and the external scanners. Every method is
// one adapter invocation; tests substitute in-memory fakes here.
#[allow(async_fn_in_trait)]
pub trait ScanTools {
    async fn permute(&self, target: &Target) -> Result<Vec<Host>, AdapterError>;
    async fn resolve(&self, candidates: Vec<Host>) -> Result<Vec<Host>, AdapterError>;
    async fn probe(&self, host: &Host) -> Result<Option<LiveEndpoint>, AdapterError>;
    async fn probe_path(&self, url: &str, path: &str)
        -> Result<Option<LiveEndpoint>, AdapterError>;
    async fn vuln_scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError>;
    async fn xss_scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError>;
    async fn port_scan(&self, host: &Host) -> Result<Vec<Finding>, AdapterError>;
}

pub struct CommandToolbox {
    permute: PermuteAdapter,
    resolve: ResolveAdapter,
    http: HttpProbeAdapter,
    vuln: VulnScanAdapter,
    xss: XssScanAdapter,
    port: PortScanAdapter,
}

impl CommandToolbox {
    // Resolves every required binary up front; a single missing tool refuses
    // the whole run before any stage is attempted.
    pub fn discover(timeout: Duration) -> Result<Self, MissingTools> {
        let mut missing = Vec::new();
        let mut resolve = |name: &'static str| match CommandRunner::resolve(name, timeout) {
            Ok(runner) => Some(runner),
            Err(_) => {
                missing.push(name.to_string());
                None
            }
        };

        let alterx = resolve("alterx");
        let dnsx = resolve("dnsx");
        let httpx = resolve("httpx");
        let nuclei = resolve("nuclei");
        let dalfox = resolve("dalfox");
        let nmap = resolve("nmap");

        match (alterx, dnsx, httpx, nuclei, dalfox, nmap) {
            (Some(alterx), Some(dnsx), Some(httpx), Some(nuclei), Some(dalfox), Some(nmap)) => {
                Ok(Self {
                    permute: PermuteAdapter::new(alterx),
                    resolve: ResolveAdapter::new(dnsx),
                    http: HttpProbeAdapter::new(httpx),
                    vuln: VulnScanAdapter::new(nuclei),
                    xss: XssScanAdapter::new(dalfox),
                    port: PortScanAdapter::new(nmap),
                })
            }
            _ => Err(MissingTools(missing)),
        }
    }
}

impl ScanTools for CommandToolbox {
    async fn permute(&self, target: &Target) -> Result<Vec<Host>, AdapterError> {
        self.permute.generate(target).await
    }

    async fn resolve(&self, candidates: Vec<Host>) -> Result<Vec<Host>, AdapterError> {
        self.resolve.resolve(&candidates).await
    }

    async fn probe(&self, host: &Host) -> Result<Option<LiveEndpoint>, AdapterError> {
        self.http.probe(host).await
    }

    async fn probe_path(
        &self,
        url: &str,
        path: &str,
    ) -> Result<Option<LiveEndpoint>, AdapterError> {
        self.http.probe_path(url, path).await
    }

    async fn vuln_scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
        self.vuln.scan(url).await
    }

    async fn xss_scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
        self.xss.scan(url).await
    }

    async fn port_scan(&self, host: &Host) -> Result<Vec<Finding>, AdapterError> {
        self.port.scan(host).await
    }
}
