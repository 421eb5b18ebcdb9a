//! Deadline enforcement at the remote-call boundary.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use super::{RemoteCall, RemoteError, RemoteReply, Runtime};
use crate::types::Target;

/// Wraps a runtime so no single call blocks longer than `timeout`.
///
/// Each call runs on its own worker thread. When the deadline passes the
/// worker is abandoned, not cancelled: the target may still act on the call.
pub struct TimedRuntime {
    inner: Arc<dyn Runtime>,
    timeout: Duration,
}

impl TimedRuntime {
    pub fn new(inner: Arc<dyn Runtime>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for TimedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedRuntime")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Runtime for TimedRuntime {
    fn invoke(&self, target: &Target, call: RemoteCall) -> Result<RemoteReply, RemoteError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let worker_target = target.clone();

        std::thread::Builder::new()
            .name("hotload-call".to_string())
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(inner.invoke(&worker_target, call));
            })
            .map_err(|e| RemoteError::rejected(format!("failed to spawn call worker: {}", e)))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(node = %target, timeout = ?self.timeout, "remote call timed out");
                Err(RemoteError::Timeout {
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(RemoteError::rejected(
                "call worker exited without a reply",
            )),
        }
    }
}
