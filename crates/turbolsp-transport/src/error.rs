//! Transport error types.

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors produced by the framing stream.
///
/// All of these are fatal to the session: the dispatch loop returns the error
/// and the endpoint tears down.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// I/O failure on the underlying stream
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header section of a frame was malformed
    #[error("malformed frame header: {0}")]
    InvalidHeader(String),

    /// A frame announced a payload larger than the configured cap
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Announced payload length
        length: usize,
        /// Configured cap
        limit: usize,
    },

    /// The frame payload was not a valid JSON-RPC envelope
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] serde_json::Error),

    /// The peer closed the stream mid-frame
    #[error("stream closed mid-frame")]
    UnexpectedEof,
}
