pub mod adapters;
pub mod cli;
pub mod executor;
pub mod models;
pub mod pipeline;
pub mod reporter;
pub mod store;

pub use adapters::{AdapterError, CommandToolbox, MissingTools, ScanTools};
pub use executor::{BatchResult, CancelToken, ItemOutcome, ProbeExecutor};
pub use models::{
    Finding, Host, LiveEndpoint, Severity, Stage, StageResult, StageStatus, Target,
};
pub use pipeline::{Pipeline, RunContext};
pub use reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
pub use store::ResultStore;
