//! Bounded fan-out/fan-in worker pool.
//!
//! Every unit of work is attempted. Outcomes flow back over a channel and are
//! re-ordered to match the input; if any unit failed, all failures are
//! returned together instead of stopping at the first one.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};

/// A worker ended without reporting an outcome (it panicked or was aborted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerLost {
    pub index: usize,
}

/// Runs `work` over `items` with at most `parallelism` units in flight.
///
/// Returns the successful values in input order, or every failure in input
/// order. `parallelism` of zero is treated as one.
pub async fn run_bounded<I, T, E, F, Fut>(
    items: Vec<I>,
    parallelism: usize,
    work: F,
) -> Result<Vec<T>, Vec<E>>
where
    I: Send + 'static,
    T: Send + 'static,
    E: From<WorkerLost> + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let permits = Arc::new(Semaphore::new(parallelism.max(1)));
    let work = Arc::new(work);
    let (tx, mut rx) = mpsc::channel(total);

    for (index, item) in items.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let work = Arc::clone(&work);
        let tx = tx.clone();
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let outcome = work(item).await;
            let _ = tx.send((index, outcome)).await;
        });
    }
    drop(tx);

    let mut slots: Vec<Option<Result<T, E>>> = (0..total).map(|_| None).collect();
    while let Some((index, outcome)) = rx.recv().await {
        slots[index] = Some(outcome);
    }

    let mut values = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(value)) => values.push(value),
            Some(Err(e)) => failures.push(e),
            None => failures.push(E::from(WorkerLost { index })),
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        tracing::debug!(
            total,
            failed = failures.len(),
            "Worker pool finished with failures"
        );
        Err(failures)
    }
}
