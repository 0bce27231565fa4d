use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::adapters::AdapterError;
use crate::models::{FailureReason, ItemFailure};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum ItemOutcome<O> {
    Success { key: String, output: O },
    Failure(ItemFailure),
}

impl<O> ItemOutcome<O> {
    pub fn key(&self) -> &str {
        match self {
            ItemOutcome::Success { key, .. } => key,
            ItemOutcome::Failure(failure) => &failure.key,
        }
    }
}

#[derive(Debug)]
pub struct BatchResult<O> {
    pub outcomes: Vec<ItemOutcome<O>>,
}

impl<O> BatchResult<O> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &O)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Success { key, output } => Some((key.as_str(), output)),
            ItemOutcome::Failure(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Success { .. } => None,
            ItemOutcome::Failure(failure) => Some(failure),
        })
    }

    pub fn succeeded(&self) -> usize {
        self.successes().count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn outcome_for(&self, key: &str) -> Option<&ItemOutcome<O>> {
        self.outcomes.iter().find(|outcome| outcome.key() == key)
    }
}

pub struct ProbeExecutor {
    semaphore: Arc<Semaphore>,
    cancel: CancelToken,
}

impl ProbeExecutor {
    pub fn new(concurrency: usize, cancel: CancelToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
        }
    }

    // Every input item produces exactly one outcome, keyed by its identity,
    // whatever order completions land in. A failure never cancels siblings;
    // cancellation only stops items that have not been dispatched yet.
    pub async fn run<I, O, K, W, Fut>(&self, items: Vec<I>, key: K, worker: W) -> BatchResult<O>
    where
        K: Fn(&I) -> String,
        W: Fn(I) -> Fut,
        Fut: Future<Output = Result<O, AdapterError>>,
    {
        let worker = &worker;
        let futures = items.into_iter().map(|item| {
            let item_key = key(&item);
            async move {
                let Ok(_permit) = self.semaphore.acquire().await else {
                    return ItemOutcome::Failure(ItemFailure::new(
                        item_key,
                        FailureReason::Cancelled,
                    ));
                };
                if self.cancel.is_cancelled() {
                    return ItemOutcome::Failure(ItemFailure::new(
                        item_key,
                        FailureReason::Cancelled,
                    ));
                }
                match worker(item).await {
                    Ok(output) => ItemOutcome::Success {
                        key: item_key,
                        output,
                    },
                    Err(err) => {
                        ItemOutcome::Failure(ItemFailure::new(item_key, err.into()))
                    }
                }
            }
        });
        BatchResult {
            outcomes: join_all(futures).await,
        }
    }
}
