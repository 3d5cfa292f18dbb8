//! Bounded worker pool that deletes tags concurrently and reports one outcome per tag.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::{DeletionOutcome, DeletionReport};

pub const DEFAULT_CONCURRENCY: u16 = 10;

/// Shared cancellation signal, checked by every worker before it dequeues the next job.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
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

pub struct DeletePool {
    concurrency: usize,
    cancel: CancelFlag,
}

impl DeletePool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `delete_one` for every tag on at most `concurrency` workers.
    ///
    /// Failures stay attached to their tag and never stop the batch. Returns once every tag has
    /// produced exactly one outcome; outcomes are in completion order.
    pub async fn delete<F, Fut>(
        &self,
        image: &str,
        tags: Vec<String>,
        delete_one: F,
    ) -> DeletionReport
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let total = tags.len();
        let mut report = DeletionReport {
            image: image.to_string(),
            outcomes: Vec::with_capacity(total),
        };
        if total == 0 {
            return report;
        }

        let (job_tx, job_rx) = mpsc::channel::<String>(total);
        for tag in tags {
            // Capacity equals the batch size and the receiver is alive, so this cannot fail.
            let _ = job_tx.send(tag).await;
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<DeletionOutcome>(total);
        let delete_one = Arc::new(delete_one);

        let workers = self.concurrency.min(total);
        debug!("Deleting {} tags of {} with {} workers", total, image, workers);

        let mut set = JoinSet::new();
        for id in 0..workers {
            set.spawn(worker(
                id,
                image.to_string(),
                Arc::clone(&job_rx),
                outcome_tx.clone(),
                Arc::clone(&delete_one),
                self.cancel.clone(),
            ));
        }
        drop(outcome_tx);

        while let Some(outcome) = outcome_rx.recv().await {
            report.outcomes.push(outcome);
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                warn!("Deletion worker for {} exited abnormally: {}", image, e);
            }
        }

        report
    }
}

async fn worker<F, Fut>(
    id: usize,
    image: String,
    jobs: Arc<Mutex<mpsc::Receiver<String>>>,
    outcomes: mpsc::Sender<DeletionOutcome>,
    delete_one: Arc<F>,
    cancel: CancelFlag,
) where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    loop {
        let cancelled = cancel.is_cancelled();
        let next = jobs.lock().await.recv().await;
        let Some(tag) = next else {
            break;
        };

        let error = if cancelled {
            Some("cancelled before deletion".to_string())
        } else {
            debug!(worker = id, "Deleting {}:{}", image, tag);
            // Call and future both run in their own task so a panic stays with this tag.
            let f = Arc::clone(&delete_one);
            let job = tag.clone();
            match tokio::spawn(async move { f(job).await }).await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{:#}", e)),
                Err(e) => Some(format!("deletion task failed: {}", e)),
            }
        };

        if outcomes.send(DeletionOutcome { tag, error }).await.is_err() {
            break;
        }
    }
}
