mod finding;
mod host;
mod stage;
mod target;

pub use finding::{Finding, FindingKey, Severity};
pub use host::{Host, LiveEndpoint};
pub use stage::{FailureReason, ItemFailure, Stage, StageResult, StageStatus};
pub use target::{InvalidTarget, Target};
