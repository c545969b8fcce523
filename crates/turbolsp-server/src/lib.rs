//! # TurboLSP Server
//!
//! The endpoint core of an LSP server: it turns the bidirectional JSON-RPC
//! stream into typed handler invocations and enforces the protocol's
//! lifecycle contracts.
//!
//! Four subsystems cooperate:
//!
//! - the **dispatcher** ([`Endpoint::serve`]) decodes inbound frames, routes
//!   them to registered handlers in wire order, and enforces the
//!   initialization gate;
//! - the **reply-once coordinator** ([`ReplyOnce`]) guarantees exactly one
//!   reply per inbound call — a second reply is ignored, a forgotten reply is
//!   synthesized as an internal error;
//! - the **cancellation registry** maps inbound request ids to cancel
//!   signals, with cookie-based cleanup so clients that reuse ids cancel the
//!   right call;
//! - the **outbound call registry** tracks server-to-client calls under a
//!   hard bound, evicting the oldest when the client stops answering.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::{Value, json};
//! use turbolsp_server::{Endpoint, EndpointConfig};
//! use turbolsp_transport::StdioTransport;
//!
//! # async fn run() -> turbolsp_server::ServerResult<()> {
//! let mut endpoint = Endpoint::new(EndpointConfig::default());
//! endpoint.on_call("initialize", |_params: Value, _ctx, reply| async move {
//!     reply.ok(json!({"capabilities": {}}));
//! });
//! endpoint.on_call("shutdown", |_params: Value, _ctx, reply| async move {
//!     reply.ok(Value::Null);
//! });
//!
//! let status = endpoint.serve(StdioTransport::new()).await?;
//! if status.shutdown_requested {
//!     // clean exit
//! }
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod outbound;
pub mod reply;
pub mod writer;

mod handler;

pub use cancel::{CancelGuard, CancelRegistry};
pub use config::EndpointConfig;
pub use context::RequestContext;
pub use endpoint::{Client, Endpoint, ExitStatus};
pub use error::{ServerError, ServerResult};
pub use outbound::{Continuation, OutboundRegistry};
pub use reply::ReplyOnce;
pub use writer::MessageWriter;
