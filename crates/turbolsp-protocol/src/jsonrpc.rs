//! # JSON-RPC 2.0 Envelope
//!
//! The decoded form of a single wire frame: a call (`Request`), a
//! `Notification`, or a `Response`. The LSP base protocol never batches, so
//! unlike general-purpose JSON-RPC stacks there is no batch variant here.
//!
//! Request identifiers are preserved bit-identically between ingress and the
//! matching reply: an `i64` stays an `i64`, a string stays a string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::ErrorCode;

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version marker, serialized as the literal string `"2.0"`.
///
/// Deserialization rejects any other version, so a malformed peer is caught
/// at the envelope boundary rather than deep inside a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// Request identifier - can be a 64-bit integer or a string.
///
/// Both forms are kept as received; replies must correlate on the exact wire
/// representation. Clients that send `"id": 7` must get `"id": 7` back, not
/// `"id": "7"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier
    Number(i64),
    /// String identifier
    String(String),
}

impl RequestId {
    /// Get the numeric form, if this is an integer id.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(_) => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for RequestId {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// An inbound or outbound call: expects exactly one reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Request identifier
    pub id: RequestId,
    /// Method name (short ASCII string, case-sensitive)
    pub method: String,
    /// Raw parameters, decoded per-method by the dispatcher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Create a new call envelope.
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A fire-and-forget message: no id, no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Method name
    pub method: String,
    /// Raw parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Create a new notification envelope.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

/// Response payload - exactly one of `result` or `error` is on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Successful response
    Result {
        /// Response result (may be JSON `null`)
        result: Value,
    },
    /// Error response
    Error {
        /// Response error
        error: ResponseError,
    },
}

/// The reply to a call.
///
/// `id` is optional on ingress: a peer replying to a request it failed to
/// parse sends `"id": null`. This endpoint only issues integer ids outbound,
/// so such replies are logged and dropped by the dispatcher rather than
/// rejected at the envelope layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the call being answered
    pub id: Option<RequestId>,
    /// Result or error (mutually exclusive on the wire)
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl Response {
    /// Create a successful reply.
    pub fn ok(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: Some(id),
            payload: ResponsePayload::Result { result },
        }
    }

    /// Create an error reply.
    pub fn err(id: RequestId, error: ResponseError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: Some(id),
            payload: ResponsePayload::Error { error },
        }
    }

    /// Build a reply from a handler outcome.
    pub fn from_outcome(id: RequestId, outcome: Result<Value, ResponseError>) -> Self {
        match outcome {
            Ok(result) => Self::ok(id, result),
            Err(error) => Self::err(id, error),
        }
    }

    /// Convert the payload into a handler-facing outcome.
    pub fn into_outcome(self) -> Result<Value, ResponseError> {
        match self.payload {
            ResponsePayload::Result { result } => Ok(result),
            ResponsePayload::Error { error } => Err(error),
        }
    }

    /// True if this reply carries a result.
    pub fn is_ok(&self) -> bool {
        matches!(self.payload, ResponsePayload::Result { .. })
    }

    /// Get the error if this is an error reply.
    pub fn error(&self) -> Option<&ResponseError> {
        match &self.payload {
            ResponsePayload::Result { .. } => None,
            ResponsePayload::Error { error } => Some(error),
        }
    }
}

/// JSON-RPC error object carried inside an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code (see [`ErrorCode`])
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    /// Create an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The code as an [`ErrorCode`].
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl From<ErrorCode> for ResponseError {
    fn from(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data: None,
        }
    }
}

/// A decoded wire frame.
///
/// Variant order matters for untagged deserialization: a request carries both
/// `id` and `method`, a response carries `id` plus `result`/`error`, and a
/// notification carries `method` alone, so each frame matches exactly one
/// variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// A call expecting exactly one reply
    Request(Request),
    /// A reply to a call
    Response(Response),
    /// A fire-and-forget notification
    Notification(Notification),
}

impl Message {
    /// The method name, for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Self::Request(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Self::Notification(n)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}

/// Utility functions for whole-envelope handling.
pub mod utils {
    use super::*;
    use crate::error::ProtocolResult;

    /// Parse an envelope from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidEnvelope`](crate::error::ProtocolError)
    /// if the payload is not one of the three frame shapes.
    pub fn parse_message(json: &str) -> ProtocolResult<Message> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize an envelope to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if a params/result value refuses to serialize.
    pub fn serialize_message(message: &Message) -> ProtocolResult<String> {
        Ok(serde_json::to_string(message)?)
    }

    /// Extract the method name from a raw frame, if it has one.
    pub fn extract_method(json: &str) -> Option<String> {
        let value: Value = serde_json::from_str(json).ok()?;
        value.get("method")?.as_str().map(String::from)
    }
}
