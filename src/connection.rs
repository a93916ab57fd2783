//! Connection manager: owns the single physical channel.
//!
//! The channel is established lazily on the first call, shared by every
//! in-flight call, and torn down whenever the inbound side sees EOF, an
//! I/O error, or a decoder desync. Teardown broadcast-rejects every
//! pending call; the next acquire reconnects transparently, so a service
//! restart is a steady-state event rather than a fatal one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::{Result, WardenError};
use crate::protocol::{FrameDecoder, Message};
use crate::registry::PendingRegistry;
use crate::transport::{PipeStream, PipeWriteHalf};

/// Connection establishment budget.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read buffer size for the inbound loop.
const READ_BUF_SIZE: usize = 8 * 1024;

/// One open duplex channel.
///
/// Writes are serialized through the mutex; `closed` flips once the read
/// loop observes the other side going away, after which the manager will
/// not hand the channel out again.
pub struct Channel {
    writer: Mutex<PipeWriteHalf>,
    closed: AtomicBool,
}

impl Channel {
    fn new(writer: PipeWriteHalf) -> Self {
        Self {
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        }
    }

    /// Check whether the read loop has declared this channel dead.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Write one framed request.
    ///
    /// A failure here is surfaced to the caller and deliberately does not
    /// tear the channel down: if the pipe really broke, the read loop
    /// sees it and performs the teardown.
    pub async fn send(&self, bytes: &[u8]) -> Result<()> {
        // Teardown marks the channel closed before draining the registry,
        // so a call whose entry missed the drain fails here at once
        // instead of sitting out its full response timeout.
        if self.is_closed() {
            return Err(WardenError::ConnectionClosed);
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// State shared between the manager, its callers, and the read loop task.
struct Shared {
    registry: Arc<PendingRegistry>,
    current: Mutex<Option<Arc<Channel>>>,
}

impl Shared {
    /// Retire `channel` and broadcast-reject every pending call, but only
    /// if it is still the current one. A stale teardown racing a newer
    /// connection must not touch the newer connection's pending entries.
    async fn teardown(&self, channel: &Arc<Channel>) {
        channel.mark_closed();

        let mut current = self.current.lock().await;
        let was_current =
            matches!(current.as_ref(), Some(active) if Arc::ptr_eq(active, channel));
        if was_current {
            *current = None;
        }
        drop(current);

        if was_current {
            self.registry.reject_all();
            tracing::debug!("warden channel closed");
        }
    }
}

/// Owner of the single physical channel to the warden service.
pub struct ConnectionManager {
    pipe_path: String,
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Create a manager for the given endpoint.
    pub fn new(pipe_path: impl Into<String>, registry: Arc<PendingRegistry>) -> Self {
        Self {
            pipe_path: pipe_path.into(),
            shared: Arc::new(Shared {
                registry,
                current: Mutex::new(None),
            }),
        }
    }

    /// The registry shared with the read loop.
    pub fn registry(&self) -> &Arc<PendingRegistry> {
        &self.shared.registry
    }

    /// Get the open channel, connecting first if necessary.
    ///
    /// The state lock doubles as the shared in-flight attempt: concurrent
    /// callers queue on it and the first one through performs the single
    /// physical connect, so N simultaneous acquires produce exactly one
    /// connection. The connect races a [`CONNECT_TIMEOUT`] timer; losing
    /// the race drops the nascent attempt and fails the acquire.
    pub async fn acquire(&self) -> Result<Arc<Channel>> {
        let mut current = self.shared.current.lock().await;

        if let Some(channel) = current.as_ref() {
            if !channel.is_closed() {
                return Ok(channel.clone());
            }
            *current = None;
        }

        let connect = PipeStream::connect(&self.pipe_path);
        let stream = match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
            Ok(connected) => connected?,
            Err(_) => return Err(WardenError::ConnectTimeout),
        };
        tracing::info!(path = %self.pipe_path, "connected to warden service");

        let (reader, writer) = stream.into_split();
        let channel = Arc::new(Channel::new(writer));
        *current = Some(channel.clone());

        let shared = self.shared.clone();
        let read_channel = channel.clone();
        tokio::spawn(async move {
            if let Err(e) = read_loop(reader, &shared.registry).await {
                tracing::error!("read loop error: {}", e);
            }
            shared.teardown(&read_channel).await;
        });

        Ok(channel)
    }

    /// Explicitly close the current channel, rejecting all pending calls.
    pub async fn disconnect(&self) {
        let channel = self.shared.current.lock().await.take();
        if let Some(channel) = channel {
            channel.mark_closed();
        }
        self.shared.registry.reject_all();
        tracing::debug!("disconnected from warden service");
    }
}

/// Inbound half: feed every chunk through the frame decoder and dispatch
/// each decoded message against the pending registry.
///
/// Returns `Ok(())` on clean EOF; any error means the channel is done for.
async fn read_loop<R>(mut reader: R, registry: &PendingRegistry) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => return Ok(()), // Connection closed
            Ok(n) => n,
            Err(e) => return Err(WardenError::Io(e)),
        };

        for message in decoder.push(&buf[..n])? {
            dispatch(message, registry);
        }
    }
}

/// Route one decoded message. Only responses carry a correlation id;
/// everything else must not disturb registry state.
fn dispatch(message: Message, registry: &PendingRegistry) {
    match message {
        Message::Response(response) => {
            let request_id = response.request_id.clone();
            if !registry.resolve(&request_id, response) {
                tracing::warn!(%request_id, "dropping response for unknown request");
            }
        }
        Message::Event(event) => {
            tracing::debug!(event_type = %event.event_type, "ignoring unsolicited event");
        }
        Message::Request(request) => {
            tracing::warn!(action = %request.action, "ignoring unexpected request from service");
        }
    }
}
