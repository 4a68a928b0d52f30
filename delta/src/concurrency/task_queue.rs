use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::bail;
use crate::concurrency::cancellation::{CancellationRx, CancellationTx, create_cancellation};
use crate::error::{DeltaResult, ErrorKind};

#[derive(Debug)]
enum QueueSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

#[derive(Debug)]
enum QueueReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

impl<T> QueueReceiver<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            QueueReceiver::Bounded(rx) => rx.recv().await,
            QueueReceiver::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Handle given to the producer of a [`TaskQueue`] run.
#[derive(Debug)]
pub struct ProducerContext<T> {
    sender: QueueSender<T>,
    queued: Arc<AtomicUsize>,
    cancellation: CancellationRx,
}

impl<T> ProducerContext<T> {
    /// Enqueues an item, waiting for room when the queue is bounded.
    ///
    /// Fails with [`ErrorKind::OperationCanceled`] once the run was cancelled and with
    /// [`ErrorKind::QueueClosed`] when every consumer has stopped.
    pub async fn enqueue(&self, item: T) -> DeltaResult<()> {
        self.cancellation.ensure_active()?;

        // Counted before sending so a fast consumer never observes a negative length.
        self.queued.fetch_add(1, Ordering::SeqCst);
        let sent = match &self.sender {
            QueueSender::Bounded(tx) => {
                let mut cancellation = self.cancellation.clone();
                tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => {
                        self.queued.fetch_sub(1, Ordering::SeqCst);
                        bail!(ErrorKind::OperationCanceled, "The operation was cancelled");
                    }
                    sent = tx.send(item) => sent.is_ok(),
                }
            }
            QueueSender::Unbounded(tx) => tx.send(item).is_ok(),
        };

        if !sent {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            bail!(ErrorKind::QueueClosed, "The task queue consumers have stopped");
        }

        Ok(())
    }

    /// Number of items enqueued and not yet picked up by a consumer.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Producer/consumer pipeline with a fixed number of consumers.
///
/// The producer fills the queue and returns; consumers drain it until it is empty and the
/// producer is done. The first failure from either side cancels every participant.
pub struct TaskQueue<T, P, C> {
    worker_count: usize,
    max_queue_size: Option<usize>,
    produce: P,
    consume: C,
    _item: PhantomData<fn() -> T>,
}

impl<T, P, C> fmt::Debug for TaskQueue<T, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("worker_count", &self.worker_count)
            .field("max_queue_size", &self.max_queue_size)
            .finish_non_exhaustive()
    }
}

impl<T, P, C, PFut, CFut> TaskQueue<T, P, C>
where
    T: Send + 'static,
    P: FnOnce(ProducerContext<T>, CancellationRx) -> PFut,
    PFut: Future<Output = DeltaResult<()>> + Send + 'static,
    C: Fn(T, CancellationRx) -> CFut + Send + Sync + 'static,
    CFut: Future<Output = DeltaResult<()>> + Send + 'static,
{
    /// Creates a queue without a size limit.
    pub fn new(worker_count: usize, produce: P, consume: C) -> DeltaResult<Self> {
        Self::build(worker_count, None, produce, consume)
    }

    /// Creates a queue holding at most `max_queue_size` items; the producer waits for room.
    pub fn bounded(
        worker_count: usize,
        max_queue_size: usize,
        produce: P,
        consume: C,
    ) -> DeltaResult<Self> {
        if max_queue_size == 0 {
            bail!(
                ErrorKind::ValidationError,
                "The maximum queue size must be at least 1"
            );
        }

        Self::build(worker_count, Some(max_queue_size), produce, consume)
    }

    fn build(
        worker_count: usize,
        max_queue_size: Option<usize>,
        produce: P,
        consume: C,
    ) -> DeltaResult<Self> {
        if worker_count == 0 {
            bail!(
                ErrorKind::ValidationError,
                "The worker count must be at least 1"
            );
        }

        Ok(Self {
            worker_count,
            max_queue_size,
            produce,
            consume,
            _item: PhantomData,
        })
    }

    /// Runs the producer and the consumers to completion.
    pub async fn run(self) -> DeltaResult<()> {
        let (cancellation_tx, cancellation_rx) = create_cancellation();
        let (sender, receiver) = match self.max_queue_size {
            Some(size) => {
                let (tx, rx) = mpsc::channel(size);
                (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
            }
        };

        let queued = Arc::new(AtomicUsize::new(0));
        let receiver = Arc::new(Mutex::new(receiver));
        let consume = Arc::new(self.consume);

        let mut tasks = JoinSet::new();

        let context = ProducerContext {
            sender,
            queued: queued.clone(),
            cancellation: cancellation_rx.clone(),
        };
        // The context moves into the producer future; dropping it closes the queue.
        let producer = (self.produce)(context, cancellation_rx.clone());
        tasks.spawn(async move {
            let result = producer.await;
            if let Err(err) = &result {
                warn!(error = %err, "the task queue producer failed");
            }
            result
        });

        for worker_id in 0..self.worker_count {
            let receiver = receiver.clone();
            let queued = queued.clone();
            let consume = consume.clone();
            let mut cancellation = cancellation_rx.clone();
            tasks.spawn(async move {
                loop {
                    let item = {
                        let mut receiver = receiver.lock().await;
                        tokio::select! {
                            biased;
                            _ = cancellation.cancelled() => None,
                            item = receiver.recv() => item,
                        }
                    };

                    let Some(item) = item else {
                        debug!(worker_id, "task queue consumer finished");
                        return Ok(());
                    };
                    queued.fetch_sub(1, Ordering::SeqCst);

                    if let Err(err) = consume(item, cancellation.clone()).await {
                        warn!(worker_id, error = %err, "a task queue consumer failed");
                        return Err(err);
                    }
                }
            });
        }

        join_cancelling_on_failure(tasks, &cancellation_tx).await
    }
}

async fn join_cancelling_on_failure(
    mut tasks: JoinSet<DeltaResult<()>>,
    cancellation_tx: &CancellationTx,
) -> DeltaResult<()> {
    let mut failure = None;
    while let Some(result) = tasks.join_next().await {
        let result = match result {
            Ok(result) => result,
            Err(join_err) if join_err.is_cancelled() => continue,
            Err(join_err) => Err(join_err.into()),
        };

        if let Err(err) = result
            && failure.is_none()
        {
            cancellation_tx.cancel();
            tasks.abort_all();
            failure = Some(err);
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
