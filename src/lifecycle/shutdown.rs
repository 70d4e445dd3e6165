//! Shutdown coordination for the file server.
//!
//! ```text
//! Running ──interrupt / trigger()──▶ Draining ──all connections done──▶ Terminated
//!                                       │
//!                                       └──timeout / second interrupt──▶ forced close ──▶ Terminated
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use tokio::sync::{watch, Notify};

/// Lifecycle state of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Accepting and serving connections.
    Running,
    /// No new connections; in-flight requests are finishing.
    Draining,
    /// The server has stopped.
    Terminated,
}

/// Coordinator for graceful shutdown.
///
/// Cheap to clone; all clones share one state machine. The server obtains its
/// [`Handle`] from here and calls [`ShutdownCoordinator::finish`] once it has
/// stopped serving.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<ShutdownState>,
    handle: Handle,
    timeout: Duration,
    trigger: Notify,
}

impl ShutdownCoordinator {
    /// Create a coordinator that drains for at most `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            inner: Arc::new(Inner {
                state,
                handle: Handle::new(),
                timeout,
                trigger: Notify::new(),
            }),
        }
    }

    pub fn state(&self) -> ShutdownState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.inner.state.subscribe()
    }

    /// Handle the listening server must be attached to.
    pub fn server_handle(&self) -> Handle {
        self.inner.handle.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Start draining as if an interrupt had been received.
    pub fn trigger(&self) {
        self.inner.trigger.notify_one();
    }

    /// Record that the server stopped serving.
    pub fn finish(&self) {
        self.inner.state.send_replace(ShutdownState::Terminated);
    }

    /// Wait until the server has stopped.
    pub async fn terminated(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so this only ends once Terminated is seen.
        let _ = rx.wait_for(|s| *s == ShutdownState::Terminated).await;
    }

    /// Drive the state machine.
    ///
    /// `interrupt` is called to wait for each interrupt; the first one starts
    /// the drain, a second one while draining forces every connection closed.
    pub async fn run<F, Fut>(self, mut interrupt: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        tokio::select! {
            _ = interrupt() => {}
            _ = self.inner.trigger.notified() => {}
            _ = self.terminated() => return,
        }

        self.begin_drain();

        tokio::select! {
            _ = self.terminated() => {
                tracing::info!("All connections drained");
            }
            _ = tokio::time::sleep(self.inner.timeout) => {
                tracing::warn!(
                    timeout = ?self.inner.timeout,
                    connections = self.inner.handle.connection_count(),
                    "Drain timeout elapsed, closing remaining connections"
                );
                self.inner.handle.shutdown();
            }
            _ = interrupt() => {
                tracing::warn!(
                    connections = self.inner.handle.connection_count(),
                    "Second interrupt received, forcing shutdown"
                );
                self.inner.handle.shutdown();
            }
        }
    }

    fn begin_drain(&self) {
        let changed = self.inner.state.send_if_modified(|state| {
            if *state == ShutdownState::Running {
                *state = ShutdownState::Draining;
                true
            } else {
                false
            }
        });
        if !changed {
            return;
        }

        tracing::info!("Exiting nicely.  Interrupt again to force.");
        self.inner.handle.graceful_shutdown(Some(self.inner.timeout));
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("state", &self.state())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}
