//! Wire message envelope shared with the warden service.
//!
//! Both directions carry JSON objects with PascalCase fields (the service
//! is a .NET peer), internally tagged by `MessageType`:
//!
//! - `request` (client to service): `Action` plus optional `Payload`
//! - `response` (service to client): `RequestId` echoes the request's
//!   `MessageId` and is the correlation key
//! - `event` (service to client): unsolicited, not correlated to any call

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Well-known action names accepted by the warden service.
pub mod actions {
    pub const JOB_CREATE: &str = "job:create";
    pub const JOB_ASSIGN: &str = "job:assign";
    pub const JOB_TERMINATE: &str = "job:terminate";
    pub const JOB_STATS: &str = "job:stats";
    pub const JOB_LIST: &str = "job:list";

    pub const CAPABILITY_REQUEST: &str = "capability:request";
    pub const CAPABILITY_VALIDATE: &str = "capability:validate";
    pub const CAPABILITY_REVOKE: &str = "capability:revoke";
    pub const CAPABILITY_LIST: &str = "capability:list";

    pub const WFP_CREATE_RULE: &str = "wfp:create-rule";
    pub const WFP_DELETE_RULE: &str = "wfp:delete-rule";
    pub const WFP_LIST_RULES: &str = "wfp:list-rules";

    pub const PING: &str = "ping";
}

/// Opaque key/value request payload.
pub type Payload = Map<String, Value>;

/// Any message that can appear on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "MessageType", rename_all = "lowercase")]
pub enum Message {
    Request(Request),
    Response(Response),
    Event(Event),
}

/// Client-to-service command.
///
/// Constructed fresh per call and discarded after sending; only its
/// `message_id` lives on, as the pending-registry key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Request {
    pub message_id: String,
    pub timestamp: i64,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Request {
    /// Build a request with a fresh unique id and the current timestamp.
    pub fn new(action: impl Into<String>, payload: Option<Payload>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            timestamp: epoch_ms(),
            action: action.into(),
            payload,
        }
    }
}

/// Service-to-client reply, correlated by `request_id`.
///
/// The transport hands this back untouched; inspecting `success` and
/// `error` is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Response {
    pub message_id: String,
    pub timestamp: i64,
    pub request_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Build a successful response to `request_id`. Used by test doubles
    /// standing in for the service.
    pub fn ok(request_id: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            timestamp: epoch_ms(),
            request_id: request_id.into(),
            success: true,
            data,
            error: None,
        }
    }

    /// Build a failed response to `request_id`.
    pub fn err(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            timestamp: epoch_ms(),
            request_id: request_id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Unsolicited service-to-client notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub message_id: String,
    pub timestamp: i64,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
