//! # TurboLSP Protocol
//!
//! JSON-RPC 2.0 message types for the TurboLSP endpoint core: the envelope
//! (requests, notifications, responses), request identifiers, the LSP error
//! code set, and position offset encodings.
//!
//! This crate is the foundation layer. It knows nothing about transports or
//! dispatch; it only defines what travels on the wire. Payloads of concrete
//! LSP methods stay opaque (`serde_json::Value`) — decoding them is the
//! dispatcher's per-method concern.

pub mod encoding;
pub mod error;
pub mod jsonrpc;
pub mod methods;

pub use encoding::OffsetEncoding;
pub use error::{ErrorCode, ProtocolError, ProtocolResult};
pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcVersion, Message, Notification, Request, RequestId, Response,
    ResponseError, ResponsePayload,
};
