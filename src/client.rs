//! RPC client façade.
//!
//! [`WardenClient`] composes the other pieces: it acquires the shared
//! channel from the connection manager, writes a framed request,
//! registers a correlation entry, and hands back whatever the registry
//! eventually dispatches for it.
//!
//! Per logical call the lifecycle is:
//! created → awaiting-channel → awaiting-response → one of
//! {resolved, rejected(timeout), rejected(disconnect), rejected(write error)}.
//!
//! # Example
//!
//! ```ignore
//! use warden_client::{protocol::actions, WardenClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), warden_client::WardenError> {
//!     let client = WardenClient::new();
//!
//!     let pong = client.ping().await?;
//!     assert!(pong.success);
//!
//!     let jobs = client.call(actions::JOB_LIST, None).await?;
//!     println!("{:?}", jobs.data);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::connection::ConnectionManager;
use crate::error::{Result, WardenError};
use crate::protocol::{actions, Message, Payload, Request, Response};
use crate::registry::PendingRegistry;
use crate::transport::DEFAULT_PIPE_PATH;

/// Per-call response budget.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the warden privileged companion service.
///
/// Owns the connection manager and the pending registry outright, so two
/// clients never share hidden state. Cheap to share behind an `Arc`;
/// every method takes `&self` and calls multiplex freely over the one
/// channel, each unblocking by its own correlation id regardless of
/// response arrival order.
pub struct WardenClient {
    manager: ConnectionManager,
}

impl WardenClient {
    /// Create a client for the well-known service endpoint.
    pub fn new() -> Self {
        Self::with_pipe_path(DEFAULT_PIPE_PATH)
    }

    /// Create a client for a custom endpoint (tests, embedded setups).
    pub fn with_pipe_path(path: impl Into<String>) -> Self {
        let registry = Arc::new(PendingRegistry::new());
        Self {
            manager: ConnectionManager::new(path, registry),
        }
    }

    /// Send `action` to the service and await its response.
    ///
    /// Connects lazily if no channel is open. Fails when the channel
    /// cannot be acquired, the write fails, no response arrives within
    /// [`CALL_TIMEOUT`], or the connection closes mid-flight. The
    /// response is returned untouched either way; inspecting `success`
    /// and `error` is the caller's job, as is validating `payload`
    /// against the action's schema before calling.
    pub async fn call(&self, action: &str, payload: Option<Payload>) -> Result<Response> {
        let request = Request::new(action, payload);
        let message_id = request.message_id.clone();
        let bytes = serde_json::to_vec(&Message::Request(request))?;

        let channel = self.manager.acquire().await?;

        let rx = self.manager.registry().register(&message_id);

        if let Err(e) = channel.send(&bytes).await {
            // Fail this call now rather than letting its timer run out.
            self.manager.registry().remove(&message_id);
            return Err(e);
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Sender dropped without completing: the channel went away.
            Ok(Err(_)) => Err(WardenError::ConnectionClosed),
            Err(_) => {
                self.manager.registry().remove(&message_id);
                Err(WardenError::RequestTimeout)
            }
        }
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<Response> {
        self.call(actions::PING, None).await
    }

    /// Close the channel and reject everything pending.
    ///
    /// The next call reconnects transparently.
    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.manager.registry().len()
    }
}

impl Default for WardenClient {
    fn default() -> Self {
        Self::new()
    }
}
