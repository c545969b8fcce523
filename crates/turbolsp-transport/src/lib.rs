//! # TurboLSP Transport
//!
//! The byte-facing layer of the endpoint: LSP base-protocol framing
//! (`Content-Length` headers + JSON payload) as a `tokio-util` codec, minimal
//! stream/sink traits so the dispatcher never assumes a particular frame
//! source, and a stdio transport for the common deployment.
//!
//! Failure semantics are deliberately blunt: any read, decode, or write
//! failure is fatal to the session. There is no reconnect and no resync —
//! a desynchronized framing stream cannot be trusted again.

pub mod codec;
pub mod error;
pub mod stdio;
pub mod traits;

pub use codec::{ContentLengthCodec, DEFAULT_MAX_FRAME_BYTES};
pub use error::{TransportError, TransportResult};
pub use stdio::{FrameReader, FrameWriter, StdioTransport};
pub use traits::{MessageSink, MessageStream, Transport};
