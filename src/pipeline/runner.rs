use std::future::Future;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use super::context::RunContext;
use crate::adapters::AdapterError;
use crate::executor::{ItemOutcome, ProbeExecutor};
use crate::models::{FailureReason, Finding, ItemFailure, Stage, StageResult};
use crate::store::ResultStore;

pub struct StageRunner<'a> {
    ctx: &'a RunContext,
    store: &'a ResultStore,
}

impl<'a> StageRunner<'a> {
    pub fn new(ctx: &'a RunContext, store: &'a ResultStore) -> Self {
        Self { ctx, store }
    }

    // Runs one stage as a bounded fan-out over its input batch and leaves the
    // store holding a terminal StageResult. An empty input set fails the
    // stage immediately without touching any adapter.
    pub async fn run_batch<I, K, W, Fut>(
        &self,
        stage: Stage,
        concurrency: usize,
        items: Vec<I>,
        key: K,
        worker: W,
    ) -> Result<StageResult>
    where
        K: Fn(&I) -> String,
        W: Fn(I) -> Fut,
        Fut: Future<Output = Result<Vec<Finding>, AdapterError>>,
    {
        self.store.begin(stage);

        if items.is_empty() {
            self.store
                .record_failure(stage, ItemFailure::new("*", FailureReason::EmptyInput));
            return self.store.finalize(stage, 0);
        }

        let attempted = items.len();
        let pb = create_progress_bar(stage, attempted);
        let executor = ProbeExecutor::new(concurrency, self.ctx.cancel.clone());

        let batch = executor
            .run(items, key, |item| {
                let fut = worker(item);
                let pb = pb.clone();
                async move {
                    let outcome = fut.await;
                    pb.inc(1);
                    outcome
                }
            })
            .await;

        pb.finish_and_clear();

        for outcome in batch.outcomes {
            match outcome {
                ItemOutcome::Success { output, .. } => {
                    for finding in output {
                        self.store.record(finding);
                    }
                }
                ItemOutcome::Failure(failure) => {
                    self.store.record_failure(stage, failure);
                }
            }
        }

        self.store.finalize(stage, attempted)
    }
}

fn create_progress_bar(stage: Stage, total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:<20} [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_prefix(stage.label());
    pb
}
