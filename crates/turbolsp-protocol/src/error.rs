//! Protocol error codes and envelope-level errors.

use std::fmt;

/// The JSON-RPC / LSP integer error code set used by the dispatcher.
///
/// Codes in the `-32099..=-32000` band are reserved by JSON-RPC for
/// implementations; LSP assigns `-32002` there. The `-32899..=-32800` band is
/// reserved by the LSP itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Parse error (-32700)
    ParseError,
    /// Invalid request (-32600)
    InvalidRequest,
    /// Method not found (-32601)
    MethodNotFound,
    /// Invalid params (-32602)
    InvalidParams,
    /// Internal error (-32603)
    InternalError,
    /// Server not initialized (-32002)
    ServerNotInitialized,
    /// Request cancelled (-32800)
    RequestCancelled,
    /// Content modified (-32801)
    ContentModified,
    /// Any other integer code
    Other(i32),
}

impl ErrorCode {
    /// Get the numeric error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerNotInitialized => -32002,
            Self::RequestCancelled => -32800,
            Self::ContentModified => -32801,
            Self::Other(code) => *code,
        }
    }

    /// Get the standard error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ServerNotInitialized => "Server not initialized",
            Self::RequestCancelled => "Request cancelled",
            Self::ContentModified => "Content modified",
            Self::Other(_) => "Server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32002 => Self::ServerNotInitialized,
            -32800 => Self::RequestCancelled,
            -32801 => Self::ContentModified,
            other => Self::Other(other),
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors produced while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The frame payload was not a valid JSON-RPC envelope
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),

    /// The envelope was structurally valid but violates the protocol
    #[error("protocol violation: {0}")]
    Violation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
        assert_eq!(ErrorCode::ServerNotInitialized.code(), -32002);
        assert_eq!(ErrorCode::RequestCancelled.code(), -32800);
        assert_eq!(ErrorCode::ContentModified.code(), -32801);
    }

    #[test]
    fn test_error_code_from_i32_roundtrip() {
        for code in [-32700, -32600, -32601, -32602, -32603, -32002, -32800, -32801] {
            assert_eq!(ErrorCode::from(code).code(), code);
        }
        assert_eq!(ErrorCode::from(-32099), ErrorCode::Other(-32099));
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::ServerNotInitialized.to_string(),
            "Server not initialized (-32002)"
        );
    }
}
