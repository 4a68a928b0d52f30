use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::bail;
use crate::error::{DeltaResult, ErrorKind};

#[derive(Debug)]
struct QueueState<T> {
    pending: VecDeque<T>,
    /// Items dequeued whose produced items have not been pushed back yet.
    in_progress: usize,
    closed: bool,
}

#[derive(Debug)]
struct Shared<T> {
    state: Mutex<QueueState<T>>,
    changed: Notify,
}

impl<T> Shared<T> {
    /// Takes the next item, waiting while other workers may still produce more.
    ///
    /// Returns `None` once the queue is closed. The worker observing an empty queue with
    /// nothing in progress closes it and wakes every waiter.
    async fn dequeue(&self) -> Option<T> {
        loop {
            // Registered before inspecting the state so a concurrent `notify_waiters` is not lost.
            let changed = self.changed.notified();

            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return None;
                }

                if let Some(item) = state.pending.pop_front() {
                    state.in_progress += 1;
                    return Some(item);
                }

                if state.in_progress == 0 {
                    state.closed = true;
                    drop(state);
                    self.changed.notify_waiters();
                    return None;
                }
            }

            changed.await;
        }
    }

    /// Pushes produced items and releases the in-progress slot of the item they came from.
    async fn complete(&self, produced: Vec<T>) {
        {
            let mut state = self.state.lock().await;
            state.in_progress -= 1;

            if !state.closed {
                state.pending.extend(produced);
                if state.pending.is_empty() && state.in_progress == 0 {
                    state.closed = true;
                }
            }
        }

        self.changed.notify_waiters();
    }

    async fn close(&self) {
        self.state.lock().await.closed = true;
        self.changed.notify_waiters();
    }
}

/// Work queue where processing an item may yield more items.
///
/// A fixed pool of workers drains the queue. The run finishes when the queue is empty and
/// no worker is processing an item, since only in-flight items can produce new work.
#[derive(Debug)]
pub struct ProducerQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ProducerQueue<T>
where
    T: Send + 'static,
{
    /// Creates a queue seeded with `initial` items.
    pub fn new<I>(initial: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let state = QueueState {
            pending: initial.into_iter().collect(),
            in_progress: 0,
            closed: false,
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                changed: Notify::new(),
            }),
        }
    }

    /// Runs `worker_count` workers until the queue drains or one of them fails.
    ///
    /// The first failure closes the queue, aborts the remaining workers and is returned.
    pub async fn run<F, Fut>(self, worker_count: usize, produce: F) -> DeltaResult<()>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DeltaResult<Vec<T>>> + Send + 'static,
    {
        if worker_count == 0 {
            bail!(
                ErrorKind::ValidationError,
                "The worker count must be at least 1"
            );
        }

        let produce = Arc::new(produce);
        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let shared = self.shared.clone();
            let produce = produce.clone();
            workers.spawn(async move {
                let mut processed = 0usize;
                while let Some(item) = shared.dequeue().await {
                    match produce(item).await {
                        Ok(produced) => {
                            shared.complete(produced).await;
                            processed += 1;
                        }
                        Err(err) => {
                            warn!(worker_id, error = %err, "producer queue worker failed");
                            shared.close().await;
                            return Err(err);
                        }
                    }
                }

                debug!(worker_id, processed, "producer queue worker finished");

                Ok(())
            });
        }

        let mut failure = None;
        while let Some(result) = workers.join_next().await {
            let result = match result {
                Ok(result) => result,
                Err(join_err) if join_err.is_cancelled() => continue,
                Err(join_err) => Err(join_err.into()),
            };

            if let Err(err) = result
                && failure.is_none()
            {
                error!(error = %err, "aborting producer queue after worker failure");
                self.shared.close().await;
                workers.abort_all();
                failure = Some(err);
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
