//! Frame decoder for the inbound byte stream.
//!
//! The warden service writes back-to-back JSON objects with no length
//! prefix or delimiter, and the OS is free to split or coalesce them at
//! any byte boundary. The decoder keeps unconsumed input in a
//! `bytes::BytesMut` and scans it incrementally: a brace-depth counter,
//! an in-string flag, and an escape-pending flag together locate
//! candidate object spans, which are then decoded with serde_json.
//!
//! # Example
//!
//! ```ignore
//! use warden_client::protocol::FrameDecoder;
//!
//! let mut decoder = FrameDecoder::new();
//!
//! // Data arrives in arbitrary chunks from the pipe
//! let messages = decoder.push(chunk)?;
//! for message in messages {
//!     // complete messages, in stream order
//! }
//! ```

use bytes::BytesMut;

use crate::error::{Result, WardenError};
use crate::protocol::Message;

/// Retained-byte cap before the decoder gives up resynchronizing.
///
/// A balanced-but-undecodable span is left buffered in the hope that it
/// is merely incomplete; if the buffer grows past this cap without
/// producing a message, the stream is considered desynchronized.
pub const MAX_BUFFERED_BYTES: usize = 1024 * 1024;

/// Scan state covering `buffer[..scan_pos]`.
#[derive(Debug, Clone, Copy)]
struct ScanState {
    /// Brace depth, counted outside string literals only.
    depth: u32,
    /// Offset of the current top-level object's `{`, if one is open.
    start: Option<usize>,
    /// Inside a JSON string literal.
    in_string: bool,
    /// Previous byte was an unconsumed backslash.
    escaped: bool,
}

impl ScanState {
    fn reset() -> Self {
        Self {
            depth: 0,
            start: None,
            in_string: false,
            escaped: false,
        }
    }
}

/// Buffer for accumulating inbound bytes and extracting complete messages.
///
/// Partial trailing input is retained across pushes, so an object split
/// mid-string or mid-escape completes once the rest of it arrives.
pub struct FrameDecoder {
    /// Unconsumed bytes from pipe reads.
    buffer: BytesMut,
    /// Next unscanned offset into `buffer`.
    scan_pos: usize,
    /// Scanner state for the bytes already examined.
    state: ScanState,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            scan_pos: 0,
            state: ScanState::reset(),
        }
    }

    /// Push a chunk and extract every complete message it finishes.
    ///
    /// Returns the messages in stream order; the vector is empty when the
    /// chunk only extends a partial object. Bytes preceding a top-level
    /// `{` are skipped and discarded. A span that balances its braces but
    /// fails to decode is left buffered for more input, bounded by
    /// [`MAX_BUFFERED_BYTES`].
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>> {
        self.buffer.extend_from_slice(data);

        let mut messages = Vec::new();

        while self.scan_pos < self.buffer.len() {
            let byte = self.buffer[self.scan_pos];

            if self.state.escaped {
                // The byte after a backslash never affects the scanner,
                // so `\"` keeps the string open and `\\` cannot escape
                // the character that follows it.
                self.state.escaped = false;
            } else if self.state.in_string {
                match byte {
                    b'\\' => self.state.escaped = true,
                    b'"' => self.state.in_string = false,
                    _ => {}
                }
            } else {
                match byte {
                    b'"' => self.state.in_string = true,
                    b'{' => {
                        if self.state.start.is_none() {
                            self.state.start = Some(self.scan_pos);
                        }
                        self.state.depth += 1;
                    }
                    // A stray `}` outside any object is junk; depth only
                    // moves between a `{` and its match.
                    b'}' if self.state.depth > 0 => {
                        self.state.depth -= 1;
                        if self.state.depth == 0 {
                            let start = self
                                .state
                                .start
                                .expect("open object has a start offset");
                            let end = self.scan_pos + 1;

                            let decoded =
                                serde_json::from_slice::<Message>(&self.buffer[start..end]);
                            match decoded {
                                Ok(message) => {
                                    messages.push(message);
                                    let _ = self.buffer.split_to(end);
                                    self.scan_pos = 0;
                                    self.state = ScanState::reset();
                                    continue;
                                }
                                Err(_) => {
                                    // Balanced but undecodable. Retain the
                                    // span and stop: more bytes may turn it
                                    // into a decodable message.
                                    let _ = self.buffer.split_to(start);
                                    self.scan_pos = 0;
                                    self.state = ScanState::reset();
                                    break;
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            self.scan_pos += 1;
        }

        // Everything scanned without an object start is inter-message
        // junk or whitespace; drop it so it cannot accumulate.
        if self.state.start.is_none() && self.scan_pos > 0 {
            let _ = self.buffer.split_to(self.scan_pos);
            self.scan_pos = 0;
            self.state = ScanState::reset();
        }

        if self.buffer.len() > MAX_BUFFERED_BYTES {
            return Err(WardenError::Desync(self.buffer.len()));
        }

        Ok(messages)
    }

    /// Number of retained, not-yet-consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the decoder holds no partial input.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
