//! Cooperative cancellation signal built on a watch channel.

use tokio::sync::watch;

use crate::bail;
use crate::error::{DeltaResult, ErrorKind};

/// Sending half. Cancelling is idempotent and visible to every receiver.
#[derive(Debug)]
pub struct CancellationTx(watch::Sender<bool>);

/// Receiving half, cloned into every participant of a run.
#[derive(Debug, Clone)]
pub struct CancellationRx(watch::Receiver<bool>);

/// Creates a cancellation channel in the non-cancelled state.
pub fn create_cancellation() -> (CancellationTx, CancellationRx) {
    let (tx, rx) = watch::channel(false);
    (CancellationTx(tx), CancellationRx(rx))
}

impl CancellationTx {
    /// Signals cancellation to every current and future receiver.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    pub fn subscribe(&self) -> CancellationRx {
        CancellationRx(self.0.subscribe())
    }
}

impl CancellationRx {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is signalled.
    ///
    /// Never resolves if the sender is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Fails with [`ErrorKind::OperationCanceled`] when cancellation was signalled.
    pub fn ensure_active(&self) -> DeltaResult<()> {
        if self.is_cancelled() {
            bail!(ErrorKind::OperationCanceled, "The operation was cancelled");
        }

        Ok(())
    }
}
