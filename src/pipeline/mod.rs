mod context;
mod orchestrator;
mod runner;

pub use context::{
    DEFAULT_CONCURRENCY, DEFAULT_PORT_CONCURRENCY, DEFAULT_SCRAPE_PATHS, DEFAULT_TIMEOUT_SECS,
    RunContext,
};
pub use orchestrator::Pipeline;
pub use runner::StageRunner;
