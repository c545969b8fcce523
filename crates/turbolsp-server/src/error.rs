//! Server error types.

use turbolsp_transport::TransportError;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can escape the dispatch loop.
///
/// Everything else — unknown methods, decode failures, double replies — is
/// contained at the request boundary and surfaces to the client as a reply
/// or to the log.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// Fatal transport failure (I/O, framing, or envelope decode)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The endpoint's writer task ended abnormally
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}
