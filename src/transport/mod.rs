//! Transport module - platform-specific pipe/socket handling.
//!
//! Provides abstraction over:
//! - Unix Domain Sockets (Linux/macOS)
//! - Named Pipes (Windows)

mod pipe;

pub use pipe::{PipeReadHalf, PipeStream, PipeWriteHalf, DEFAULT_PIPE_PATH};
