use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use scoutd::adapters::CommandToolbox;
use scoutd::cli::{Cli, Commands};
use scoutd::models::Target;
use scoutd::pipeline::{Pipeline, RunContext};
use scoutd::reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
use scoutd::store::ResultStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            target,
            output,
            concurrency,
            port_concurrency,
            timeout,
            paths,
            force,
        } => {
            run_scan(
                &target,
                output.map(PathBuf::from),
                concurrency,
                port_concurrency,
                timeout,
                paths,
                force,
            )
            .await
        }
        Commands::Report {
            input,
            format,
            output,
        } => run_report(&input, &format, output.map(PathBuf::from)),
    }
}

async fn run_scan(
    raw_target: &str,
    output: Option<PathBuf>,
    concurrency: usize,
    port_concurrency: usize,
    timeout: u64,
    paths: Option<String>,
    force: bool,
) -> ExitCode {
    // Fatal startup conditions exit before any stage is attempted.
    let target = match Target::parse(raw_target) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let mut ctx = RunContext::new(target, output);
    ctx.concurrency = concurrency;
    ctx.port_concurrency = port_concurrency;
    ctx.timeout = Duration::from_secs(timeout);
    ctx.force = force;
    if let Some(paths) = paths {
        ctx.scrape_paths = paths
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }

    let toolbox = match CommandToolbox::discover(ctx.timeout) {
        Ok(toolbox) => toolbox,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let store = match ResultStore::open(&ctx.dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "\n{} interrupt received, draining in-flight probes",
                "[!]".yellow()
            );
            cancel.cancel();
        }
    });

    println!(
        "{} scanning {} into {}",
        "[*]".cyan(),
        ctx.target,
        ctx.dir.display()
    );

    match Pipeline::new(&ctx, &store, &toolbox).run().await {
        Ok(()) => {
            let results = store.results();
            let reporter = ConsoleReporter::new();
            reporter.print_stages(&results);
            reporter.print_failures(&results);
            reporter.print_summary(&results);
            println!("{} results saved to {}", "[*]".cyan(), ctx.dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_report(input: &str, format: &str, output: Option<PathBuf>) -> ExitCode {
    let dir = PathBuf::from(input);
    if !dir.is_dir() {
        eprintln!(
            "{} no results directory at {}",
            "error:".red().bold(),
            dir.display()
        );
        return ExitCode::FAILURE;
    }

    let store = match ResultStore::open(&dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    let results = store.results();

    let label = dir
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.trim_start_matches("results_"))
        .unwrap_or("run")
        .to_string();

    let export = match format {
        "html" => {
            let path = output.unwrap_or_else(|| dir.join("report.html"));
            HtmlExporter::export(&label, &results, &path).map(|_| path)
        }
        "json" => {
            let path = output.unwrap_or_else(|| dir.join("report.json"));
            JsonExporter::export(&label, &results, &path).map(|_| path)
        }
        _ => {
            let reporter = ConsoleReporter::new();
            reporter.print_stages(&results);
            reporter.print_failures(&results);
            reporter.print_summary(&results);
            return ExitCode::SUCCESS;
        }
    };

    match export {
        Ok(path) => {
            println!("{} report written to {}", "[*]".cyan(), path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
