//! Per-request abort token.
//!
//! # Responsibilities
//! - Carry the one-way "connection aborted" signal from the transport to the pipeline
//! - Let suspension points wait on the signal cooperatively
//!
//! # Design Decisions
//! - Backed by a `watch` channel: raising is idempotent, reading never blocks
//! - The handle side never performs writes, it only flips the flag

use tokio::sync::watch;

/// Create a connected handle/signal pair for one in-flight request.
pub fn channel() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

/// Transport side of the token. Raising it more than once has no extra effect.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Mark the request as aborted.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Pipeline side of the token.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that can never fire.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { rx }
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the request has been aborted.
    ///
    /// If the transport drops its handle without aborting, this never resolves.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}
