//! # TurboLSP
//!
//! The message-dispatch and request-lifecycle core of a Language Server
//! Protocol endpoint. This facade re-exports the layered crates:
//!
//! - [`protocol`] — JSON-RPC envelope, error codes, offset encodings;
//! - [`transport`] — LSP base-protocol framing and the stdio transport;
//! - [`server`] — the endpoint: dispatcher, reply-once handles,
//!   cancellation, and bounded client-bound calls.
//!
//! Most embedders only need the [`prelude`].

pub use turbolsp_protocol as protocol;
pub use turbolsp_server as server;
pub use turbolsp_transport as transport;

pub use turbolsp_protocol::{ErrorCode, Message, OffsetEncoding, RequestId, ResponseError};
pub use turbolsp_server::{
    Client, Endpoint, EndpointConfig, ExitStatus, ReplyOnce, RequestContext, ServerError,
    ServerResult,
};
pub use turbolsp_transport::{StdioTransport, Transport, TransportError};

/// The common imports for building an endpoint.
pub mod prelude {
    pub use turbolsp_protocol::{
        ErrorCode, Message, Notification, OffsetEncoding, Request, RequestId, Response,
        ResponseError, methods,
    };
    pub use turbolsp_server::{
        Client, Endpoint, EndpointConfig, ExitStatus, ReplyOnce, RequestContext, ServerError,
        ServerResult,
    };
    pub use turbolsp_transport::{
        ContentLengthCodec, MessageSink, MessageStream, StdioTransport, Transport, TransportError,
        TransportResult,
    };
}
