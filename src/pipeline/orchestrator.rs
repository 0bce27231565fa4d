use std::collections::BTreeSet;

use anyhow::Result;
use colored::Colorize;

use super::context::RunContext;
use super::runner::StageRunner;
use crate::adapters::{compose_url, ScanTools};
use crate::models::{Finding, Host, Severity, Stage, StageResult, StageStatus};
use crate::reporter::{HtmlExporter, JsonExporter};
use crate::store::ResultStore;

pub struct Pipeline<'a, T: ScanTools> {
    ctx: &'a RunContext,
    store: &'a ResultStore,
    tools: &'a T,
}

impl<'a, T: ScanTools> Pipeline<'a, T> {
    pub fn new(ctx: &'a RunContext, store: &'a ResultStore, tools: &'a T) -> Self {
        Self { ctx, store, tools }
    }

    // Discovery and HttpProbe are strictly sequential; the four scan stages
    // after them are independent and run concurrently. A stage that fails
    // outright feeds an empty input set downstream; the run always continues
    // to the report.
    pub async fn run(&self) -> Result<()> {
        self.discovery().await?;
        self.http_probe().await?;

        let (vuln, xss, port, scrape) = futures::join!(
            self.vuln_scan(),
            self.xss_scan(),
            self.port_scan(),
            self.path_scrape()
        );
        vuln?;
        xss?;
        port?;
        scrape?;

        self.report()
    }

    fn should_skip(&self, stage: Stage) -> bool {
        !self.ctx.force && self.store.status(stage) == StageStatus::Complete
    }

    fn note_skip(&self, stage: Stage) {
        println!(
            "{} {} already complete, skipping",
            "[=]".cyan(),
            stage.label()
        );
    }

    fn announce(&self, result: &StageResult) {
        let status = match result.status {
            StageStatus::Complete => result.status.to_string().green(),
            StageStatus::PartiallyFailed => result.status.to_string().yellow(),
            _ => result.status.to_string().red(),
        };
        println!(
            "{} {}: {} ({} findings, {}/{} items ok)",
            "[+]".green(),
            result.stage.label(),
            status,
            result.findings.len(),
            result.succeeded(),
            result.attempted
        );
    }

    async fn discovery(&self) -> Result<()> {
        if self.should_skip(Stage::Discovery) {
            self.note_skip(Stage::Discovery);
            return Ok(());
        }
        let runner = StageRunner::new(self.ctx, self.store);
        let result = runner
            .run_batch(
                Stage::Discovery,
                1,
                vec![self.ctx.target.clone()],
                |target| target.to_string(),
                |target| async move {
                    let candidates = self.tools.permute(&target).await?;
                    let resolved = self.tools.resolve(candidates).await?;
                    let hosts: BTreeSet<Host> = resolved.into_iter().collect();
                    Ok(hosts
                        .into_iter()
                        .map(|host| {
                            Finding::new(
                                Stage::Discovery,
                                host.as_str(),
                                Severity::Info,
                                "resolved subdomain",
                            )
                        })
                        .collect())
                },
            )
            .await?;
        self.announce(&result);
        Ok(())
    }

    async fn http_probe(&self) -> Result<()> {
        if self.should_skip(Stage::HttpProbe) {
            self.note_skip(Stage::HttpProbe);
            return Ok(());
        }
        let hosts: Vec<Host> = self
            .store
            .subjects(Stage::Discovery)
            .iter()
            .filter_map(|subject| Host::parse(subject))
            .collect();

        let runner = StageRunner::new(self.ctx, self.store);
        let result = runner
            .run_batch(
                Stage::HttpProbe,
                self.ctx.concurrency,
                hosts,
                |host| host.to_string(),
                |host| async move {
                    let endpoint = self.tools.probe(&host).await?;
                    Ok(endpoint
                        .map(|ep| {
                            vec![Finding::new(
                                Stage::HttpProbe,
                                ep.url.clone(),
                                Severity::Info,
                                ep.summary(),
                            )]
                        })
                        .unwrap_or_default())
                },
            )
            .await?;
        self.announce(&result);
        Ok(())
    }

    async fn vuln_scan(&self) -> Result<()> {
        if self.should_skip(Stage::VulnScan) {
            self.note_skip(Stage::VulnScan);
            return Ok(());
        }
        let urls = self.store.subjects(Stage::HttpProbe);
        let runner = StageRunner::new(self.ctx, self.store);
        let result = runner
            .run_batch(
                Stage::VulnScan,
                self.ctx.concurrency,
                urls,
                |url| url.clone(),
                |url| async move { self.tools.vuln_scan(&url).await },
            )
            .await?;
        self.announce(&result);
        Ok(())
    }

    async fn xss_scan(&self) -> Result<()> {
        if self.should_skip(Stage::XssScan) {
            self.note_skip(Stage::XssScan);
            return Ok(());
        }
        let urls = self.store.subjects(Stage::HttpProbe);
        let runner = StageRunner::new(self.ctx, self.store);
        let result = runner
            .run_batch(
                Stage::XssScan,
                self.ctx.concurrency,
                urls,
                |url| url.clone(),
                |url| async move { self.tools.xss_scan(&url).await },
            )
            .await?;
        self.announce(&result);
        Ok(())
    }

    async fn port_scan(&self) -> Result<()> {
        if self.should_skip(Stage::PortScan) {
            self.note_skip(Stage::PortScan);
            return Ok(());
        }
        let hosts: Vec<Host> = self
            .store
            .subjects(Stage::HttpProbe)
            .iter()
            .filter_map(|url| Host::from_url(url))
            .collect::<BTreeSet<Host>>()
            .into_iter()
            .collect();

        let runner = StageRunner::new(self.ctx, self.store);
        let result = runner
            .run_batch(
                Stage::PortScan,
                self.ctx.port_concurrency,
                hosts,
                |host| host.to_string(),
                |host| async move { self.tools.port_scan(&host).await },
            )
            .await?;
        self.announce(&result);
        Ok(())
    }

    async fn path_scrape(&self) -> Result<()> {
        if self.should_skip(Stage::PathScrape) {
            self.note_skip(Stage::PathScrape);
            return Ok(());
        }
        let mut pairs = Vec::new();
        for url in self.store.subjects(Stage::HttpProbe) {
            for path in &self.ctx.scrape_paths {
                pairs.push((url.clone(), path.clone()));
            }
        }

        let runner = StageRunner::new(self.ctx, self.store);
        let result = runner
            .run_batch(
                Stage::PathScrape,
                self.ctx.concurrency,
                pairs,
                |(url, path)| compose_url(url, path),
                |(url, path)| async move {
                    let endpoint = self.tools.probe_path(&url, &path).await?;
                    Ok(endpoint
                        .map(|ep| {
                            vec![Finding::new(
                                Stage::PathScrape,
                                ep.url.clone(),
                                scrape_severity(&path),
                                format!("exposed path /{}: {}", path, ep.summary()),
                            )]
                        })
                        .unwrap_or_default())
                },
            )
            .await?;
        self.announce(&result);
        Ok(())
    }

    fn report(&self) -> Result<()> {
        if self.should_skip(Stage::Report) {
            self.note_skip(Stage::Report);
            return Ok(());
        }
        self.store.begin(Stage::Report);

        let results = self.store.results();
        HtmlExporter::export(
            self.ctx.target.as_str(),
            &results,
            &self.ctx.dir.join("report.html"),
        )?;
        JsonExporter::export(
            self.ctx.target.as_str(),
            &results,
            &self.ctx.dir.join("report.json"),
        )?;

        let result = self.store.finalize(Stage::Report, 1)?;
        self.announce(&result);
        Ok(())
    }
}

fn scrape_severity(path: &str) -> Severity {
    match path {
        ".env" | "backup.zip" | "config.php" => Severity::High,
        _ => Severity::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterError;
    use crate::models::{LiveEndpoint, Target};
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "scoutd-pipeline-{}-{}-{}",
            name,
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ))
    }

    struct FakeTools {
        calls: AtomicUsize,
        resolved: Vec<&'static str>,
        live: BTreeSet<&'static str>,
        probe_errors: BTreeSet<&'static str>,
    }

    impl FakeTools {
        fn scenario() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                resolved: vec!["a.example.test", "b.example.test"],
                live: BTreeSet::from(["a.example.test"]),
                probe_errors: BTreeSet::new(),
            }
        }

        fn invocations(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ScanTools for FakeTools {
        async fn permute(&self, target: &Target) -> Result<Vec<Host>, AdapterError> {
            self.tick();
            let mut candidates: Vec<Host> =
                self.resolved.iter().filter_map(|h| Host::parse(h)).collect();
            // Duplicates from the generator must not survive discovery.
            candidates.extend(Host::parse(&format!("a.{}", target)));
            Ok(candidates)
        }

        async fn resolve(&self, candidates: Vec<Host>) -> Result<Vec<Host>, AdapterError> {
            self.tick();
            Ok(candidates)
        }

        async fn probe(&self, host: &Host) -> Result<Option<LiveEndpoint>, AdapterError> {
            self.tick();
            if self.probe_errors.contains(host.as_str()) {
                return Err(AdapterError::NonZeroExit {
                    status: 1,
                    stderr: "connection refused".to_string(),
                });
            }
            if self.live.contains(host.as_str()) {
                return Ok(Some(LiveEndpoint::new(
                    format!("https://{}", host),
                    200,
                    0,
                    None,
                )));
            }
            Ok(None)
        }

        async fn probe_path(
            &self,
            url: &str,
            path: &str,
        ) -> Result<Option<LiveEndpoint>, AdapterError> {
            self.tick();
            if path == "admin" {
                return Ok(Some(LiveEndpoint::new(
                    format!("{}/{}", url, path),
                    200,
                    0,
                    None,
                )));
            }
            Ok(None)
        }

        async fn vuln_scan(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
            self.tick();
            Ok(vec![Finding::new(
                Stage::VulnScan,
                url,
                Severity::High,
                "exposed git config",
            )])
        }

        async fn xss_scan(&self, _url: &str) -> Result<Vec<Finding>, AdapterError> {
            self.tick();
            Ok(Vec::new())
        }

        async fn port_scan(&self, host: &Host) -> Result<Vec<Finding>, AdapterError> {
            self.tick();
            Ok(vec![Finding::new(
                Stage::PortScan,
                host.as_str(),
                Severity::Info,
                "open port 443/tcp: https",
            )])
        }
    }

    fn context(dir: &PathBuf) -> RunContext {
        let target = Target::parse("example.test").unwrap();
        RunContext::new(target, Some(dir.clone()))
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let dir = temp_dir("e2e");
        let ctx = context(&dir);
        let store = ResultStore::open(&dir).unwrap();
        let tools = FakeTools::scenario();

        Pipeline::new(&ctx, &store, &tools).run().await.unwrap();

        assert_eq!(
            store.subjects(Stage::Discovery),
            vec!["a.example.test".to_string(), "b.example.test".to_string()]
        );

        let probe = store.snapshot(Stage::HttpProbe);
        assert_eq!(probe.status, StageStatus::Complete);
        assert_eq!(probe.attempted, 2);
        assert_eq!(
            store.subjects(Stage::HttpProbe),
            vec!["https://a.example.test".to_string()]
        );

        let vuln = store.snapshot(Stage::VulnScan);
        assert_eq!(vuln.attempted, 1);
        assert_eq!(vuln.findings.len(), 1);
        assert_eq!(vuln.findings[0].subject, "https://a.example.test");

        let xss = store.snapshot(Stage::XssScan);
        assert_eq!(xss.status, StageStatus::Complete);
        assert!(xss.findings.is_empty());

        let port = store.snapshot(Stage::PortScan);
        assert_eq!(port.attempted, 1);
        assert_eq!(port.findings[0].subject, "a.example.test");

        let scrape = store.snapshot(Stage::PathScrape);
        assert_eq!(scrape.attempted, ctx.scrape_paths.len());
        assert_eq!(scrape.findings.len(), 1);
        assert_eq!(scrape.findings[0].subject, "https://a.example.test/admin");

        assert_eq!(store.status(Stage::Report), StageStatus::Complete);
        assert!(dir.join("report.html").exists());
        assert!(dir.join("report.json").exists());

        // permute + resolve + 2 probes + vuln + xss + port + 5 scrapes
        assert_eq!(tools.invocations(), 12);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn second_run_performs_zero_invocations() {
        let dir = temp_dir("resume");
        {
            let ctx = context(&dir);
            let store = ResultStore::open(&dir).unwrap();
            let tools = FakeTools::scenario();
            Pipeline::new(&ctx, &store, &tools).run().await.unwrap();
        }

        let first = ResultStore::open(&dir).unwrap().results();

        let ctx = context(&dir);
        let store = ResultStore::open(&dir).unwrap();
        let tools = FakeTools::scenario();
        Pipeline::new(&ctx, &store, &tools).run().await.unwrap();

        assert_eq!(tools.invocations(), 0);

        let second = store.results();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.stage, b.stage);
            assert_eq!(a.status, b.status);
            assert_eq!(a.findings, b.findings);
            assert_eq!(a.failures, b.failures);
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn force_rerun_invokes_adapters_again() {
        let dir = temp_dir("force");
        {
            let ctx = context(&dir);
            let store = ResultStore::open(&dir).unwrap();
            let tools = FakeTools::scenario();
            Pipeline::new(&ctx, &store, &tools).run().await.unwrap();
        }

        let mut ctx = context(&dir);
        ctx.force = true;
        let store = ResultStore::open(&dir).unwrap();
        let tools = FakeTools::scenario();
        Pipeline::new(&ctx, &store, &tools).run().await.unwrap();

        assert_eq!(tools.invocations(), 12);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn total_probe_failure_still_reaches_report() {
        let dir = temp_dir("failure");
        let ctx = context(&dir);
        let store = ResultStore::open(&dir).unwrap();
        let mut tools = FakeTools::scenario();
        tools.probe_errors = BTreeSet::from(["a.example.test", "b.example.test"]);

        Pipeline::new(&ctx, &store, &tools).run().await.unwrap();

        assert_eq!(store.status(Stage::HttpProbe), StageStatus::Failed);
        for stage in [
            Stage::VulnScan,
            Stage::XssScan,
            Stage::PortScan,
            Stage::PathScrape,
        ] {
            let result = store.snapshot(stage);
            assert_eq!(result.status, StageStatus::Failed);
            assert_eq!(result.attempted, 0);
        }
        assert_eq!(store.status(Stage::Report), StageStatus::Complete);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn one_dead_probe_is_a_partial_failure() {
        let dir = temp_dir("partial");
        let ctx = context(&dir);
        let store = ResultStore::open(&dir).unwrap();
        let mut tools = FakeTools::scenario();
        tools.probe_errors = BTreeSet::from(["b.example.test"]);

        Pipeline::new(&ctx, &store, &tools).run().await.unwrap();

        let probe = store.snapshot(Stage::HttpProbe);
        assert_eq!(probe.status, StageStatus::PartiallyFailed);
        assert_eq!(probe.failures.len(), 1);
        assert_eq!(probe.failures[0].key, "b.example.test");
        assert_eq!(store.status(Stage::Report), StageStatus::Complete);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn probed_endpoints_derive_from_discovered_hosts() {
        let dir = temp_dir("subset");
        let ctx = context(&dir);
        let store = ResultStore::open(&dir).unwrap();
        let mut tools = FakeTools::scenario();
        tools.live = BTreeSet::from(["a.example.test", "b.example.test"]);

        Pipeline::new(&ctx, &store, &tools).run().await.unwrap();

        let hosts = store.subjects(Stage::Discovery);
        for url in store.subjects(Stage::HttpProbe) {
            let host = Host::from_url(&url).unwrap();
            assert!(hosts.contains(&host.into_string()));
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn sensitive_paths_rank_higher() {
        assert_eq!(scrape_severity(".env"), Severity::High);
        assert_eq!(scrape_severity("backup.zip"), Severity::High);
        assert_eq!(scrape_severity("admin"), Severity::Medium);
    }
}
