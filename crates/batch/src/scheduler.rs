//! Bounded-concurrency worker pool over one batch of texts.
//!
//! `W` workers share an atomic cursor. Each claims the next index, asks the
//! provider, records the outcome at that index, and then pauses for the
//! configured interval unless it just handled the final item. The aggregate
//! request rate therefore stays near `W / interval` however fast the provider
//! answers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeline::{error_placeholder, CompletionProvider};
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Default pause between consecutive requests of one worker.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(6500);

/// Default number of workers.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Runs batches through a [`CompletionProvider`].
#[derive(Clone)]
pub struct BatchScheduler {
    provider: Arc<dyn CompletionProvider>,
    concurrency: usize,
    interval: Duration,
}

impl BatchScheduler {
    /// Creates a scheduler with `concurrency` workers (at least one) pausing
    /// `interval` between requests.
    pub fn new(provider: Arc<dyn CompletionProvider>, concurrency: usize, interval: Duration) -> Self {
        Self {
            provider,
            concurrency: concurrency.max(1),
            interval,
        }
    }

    /// The provider answering requests.
    pub fn provider(&self) -> &dyn CompletionProvider {
        &*self.provider
    }

    /// Worker count.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Completes every text, returning one result per input in input order.
    ///
    /// Never fails as a whole: an item whose request fails is represented by
    /// an `[ERROR: …]` placeholder.
    pub async fn run(&self, texts: &[String], prompt: &str) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        let texts: Arc<[String]> = texts.into();
        let prompt: Arc<str> = prompt.into();
        let cursor = Arc::new(AtomicUsize::new(0));

        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency {
            let provider = Arc::clone(&self.provider);
            let texts = Arc::clone(&texts);
            let prompt = Arc::clone(&prompt);
            let cursor = Arc::clone(&cursor);
            let interval = self.interval;

            workers.spawn(async move {
                let mut finished = Vec::new();
                loop {
                    let current = cursor.fetch_add(1, Ordering::SeqCst);
                    if current >= texts.len() {
                        break;
                    }
                    let outcome = match provider.complete(&texts[current], &prompt).await {
                        Ok(text) => text,
                        Err(err) => {
                            error!(worker, index = current, error = %err, "failed to process text");
                            error_placeholder(&err.to_string())
                        }
                    };
                    finished.push((current, outcome));

                    if current + 1 < texts.len() {
                        tokio::time::sleep(interval).await;
                    }
                }
                debug!(worker, handled = finished.len(), "worker drained cursor");
                finished
            });
        }

        let mut slots: Vec<Option<String>> = vec![None; texts.len()];
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(finished) => {
                    for (index, outcome) in finished {
                        slots[index] = Some(outcome);
                    }
                }
                Err(err) => error!(error = %err, "worker task aborted"),
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| error_placeholder("worker aborted")))
            .collect()
    }
}
