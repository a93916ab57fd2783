//! # warden-client
//!
//! Client transport for talking to the warden privileged companion
//! service over a single persistent local duplex channel (Unix domain
//! socket on Unix, named pipe on Windows).
//!
//! The wire carries back-to-back JSON objects with no length prefix or
//! delimiter, and the OS may split or coalesce them at any byte
//! boundary. This crate reassembles messages from that stream,
//! multiplexes concurrent calls over the one channel, correlates each
//! response to its originating call by id, enforces per-call timeouts,
//! and reconnects transparently when the service restarts.
//!
//! ## Architecture
//!
//! - [`protocol`]: wire envelope (request/response/event) and the frame
//!   decoder that extracts complete JSON objects from raw chunks
//! - [`registry`]: pending-call registry, dispatching responses by
//!   correlation id with exactly one terminal state per call
//! - [`connection`]: lazily connects, coalesces concurrent attempts,
//!   runs the inbound read loop, broadcast-rejects on disconnect
//! - [`WardenClient`]: the `call(action, payload)` façade
//!
//! ## Example
//!
//! ```ignore
//! use warden_client::WardenClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), warden_client::WardenError> {
//!     let client = WardenClient::new();
//!     let pong = client.ping().await?;
//!     assert!(pong.success);
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod transport;

mod client;

pub use client::{WardenClient, CALL_TIMEOUT};
pub use error::{Result, WardenError};
