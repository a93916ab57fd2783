//! Protocol module - wire envelope and stream framing.
//!
//! - JSON message shapes shared with the service (request/response/event)
//! - Frame decoder that reassembles messages from arbitrary byte chunks

mod decoder;
mod message;

pub use decoder::{FrameDecoder, MAX_BUFFERED_BYTES};
pub use message::{actions, Event, Message, Payload, Request, Response};
