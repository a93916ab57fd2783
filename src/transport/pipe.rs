//! Platform-specific pipe/socket implementation.
//!
//! - Unix: Unix Domain Socket
//! - Windows: Named Pipe
//!
//! The warden service listens on a well-known endpoint; this side only
//! ever connects.
//!
//! # Example
//!
//! ```ignore
//! use warden_client::transport::{PipeStream, DEFAULT_PIPE_PATH};
//!
//! let stream = PipeStream::connect(DEFAULT_PIPE_PATH).await?;
//! let (reader, writer) = stream.into_split();
//! ```

/// Well-known endpoint the warden service listens on.
#[cfg(unix)]
pub const DEFAULT_PIPE_PATH: &str = "/tmp/warden.sock";

/// Well-known endpoint the warden service listens on.
#[cfg(windows)]
pub const DEFAULT_PIPE_PATH: &str = r"\\.\pipe\WardenService";

// ============================================================================
// Unix Implementation
// ============================================================================

#[cfg(unix)]
mod unix_impl {
    use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::net::UnixStream;

    use crate::error::Result;

    /// Read half of a connected pipe.
    pub type PipeReadHalf = OwnedReadHalf;
    /// Write half of a connected pipe.
    pub type PipeWriteHalf = OwnedWriteHalf;

    /// Unix Domain Socket stream (connected).
    pub struct PipeStream {
        stream: UnixStream,
    }

    impl PipeStream {
        /// Connect to the service's socket path.
        pub async fn connect(path: &str) -> Result<Self> {
            let stream = UnixStream::connect(path).await?;
            Ok(Self { stream })
        }

        /// Split into independently owned read and write halves.
        pub fn into_split(self) -> (PipeReadHalf, PipeWriteHalf) {
            self.stream.into_split()
        }
    }
}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
mod windows_impl {
    use tokio::io::{ReadHalf, WriteHalf};
    use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};

    use crate::error::Result;

    /// Read half of a connected pipe.
    pub type PipeReadHalf = ReadHalf<NamedPipeClient>;
    /// Write half of a connected pipe.
    pub type PipeWriteHalf = WriteHalf<NamedPipeClient>;

    /// Named pipe stream (connected).
    pub struct PipeStream {
        stream: NamedPipeClient,
    }

    impl PipeStream {
        /// Connect to the service's named pipe.
        pub async fn connect(path: &str) -> Result<Self> {
            let stream = ClientOptions::new().open(path)?;
            Ok(Self { stream })
        }

        /// Split into independently owned read and write halves.
        pub fn into_split(self) -> (PipeReadHalf, PipeWriteHalf) {
            tokio::io::split(self.stream)
        }
    }
}

#[cfg(unix)]
pub use unix_impl::{PipeReadHalf, PipeStream, PipeWriteHalf};
#[cfg(windows)]
pub use windows_impl::{PipeReadHalf, PipeStream, PipeWriteHalf};
