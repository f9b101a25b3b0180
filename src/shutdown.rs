//! Cooperative shutdown signalling for the pipeline tasks.
//!
//! One [`Shutdown`] handle fans out to any number of [`ShutdownSignal`]s.
//! Every long-running loop holds a signal and checks it at its suspension
//! point (usually inside `tokio::select!`), so the whole pipeline cancels
//! as a unit.

use tokio::sync::watch;

/// Owning side of the shutdown signal.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Creates a new, untriggered shutdown handle.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Returns a new signal tied to this handle.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Triggers shutdown. All signals resolve promptly.
    pub fn trigger(&self) {
        // Receivers may all be gone already; that is fine.
        let _ = self.tx.send(true);
    }

    /// Returns true if shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the shutdown signal, held by each pipeline task.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered.
    ///
    /// Also resolves if the owning [`Shutdown`] handle is dropped, so a
    /// task can never outlive its controller.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Returns true if shutdown has been triggered.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}
