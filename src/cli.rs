use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scoutd")]
#[command(version, about = "Concurrent subdomain reconnaissance pipeline")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Scan {
        #[arg(short, long)]
        target: String,

        #[arg(short, long)]
        output: Option<String>,

        #[arg(short, long, default_value = "10")]
        concurrency: usize,

        #[arg(long, default_value = "3")]
        port_concurrency: usize,

        #[arg(short = 'T', long, default_value = "120")]
        timeout: u64,

        #[arg(long)]
        paths: Option<String>,

        #[arg(short, long)]
        force: bool,
    },

    Report {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "console")]
        format: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}
