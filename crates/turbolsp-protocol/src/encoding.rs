//! Position offset encodings negotiated during initialization.

use serde::{Deserialize, Serialize};

/// The unit in which document positions are counted.
///
/// The LSP default is UTF-16 code units; clients may negotiate UTF-8 or
/// UTF-32 during `initialize`. The dispatcher carries the negotiated value in
/// every request context so handlers convert offsets consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OffsetEncoding {
    /// Byte offsets in the UTF-8 representation
    #[serde(rename = "utf-8")]
    Utf8,
    /// UTF-16 code units (the protocol default)
    #[default]
    #[serde(rename = "utf-16")]
    Utf16,
    /// Unicode code points
    #[serde(rename = "utf-32")]
    Utf32,
}

impl OffsetEncoding {
    /// Returns the wire name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf32 => "utf-32",
        }
    }
}

impl std::fmt::Display for OffsetEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_utf16() {
        assert_eq!(OffsetEncoding::default(), OffsetEncoding::Utf16);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&OffsetEncoding::Utf8).unwrap(),
            "\"utf-8\""
        );
        let parsed: OffsetEncoding = serde_json::from_str("\"utf-32\"").unwrap();
        assert_eq!(parsed, OffsetEncoding::Utf32);
    }
}
