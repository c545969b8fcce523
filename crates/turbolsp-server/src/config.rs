//! Endpoint configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use turbolsp_protocol::OffsetEncoding;

/// Configuration recognized by the dispatcher.
///
/// Embedders typically deserialize this from their own config file and hand
/// it to [`Endpoint::new`](crate::Endpoint::new); every field has a sensible
/// default. The frame-size cap is a transport concern and lives on the
/// transport builder instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Cap on server-to-client calls awaiting a reply. When exceeded, the
    /// oldest pending call is evicted and its continuation receives an error.
    pub max_in_flight_outbound_calls: usize,

    /// Offset encoding carried in request contexts until `initialize`
    /// negotiates another one.
    pub default_offset_encoding: OffsetEncoding,

    /// How long `serve` waits for the writer task to drain after the dispatch
    /// loop stops.
    pub shutdown_grace_seconds: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            max_in_flight_outbound_calls: 100,
            default_offset_encoding: OffsetEncoding::Utf16,
            shutdown_grace_seconds: 60,
        }
    }
}

impl EndpointConfig {
    /// Create a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bound on in-flight server-to-client calls.
    pub fn with_max_in_flight_outbound_calls(mut self, max: usize) -> Self {
        self.max_in_flight_outbound_calls = max;
        self
    }

    /// Set the offset encoding used before negotiation.
    pub fn with_default_offset_encoding(mut self, encoding: OffsetEncoding) -> Self {
        self.default_offset_encoding = encoding;
        self
    }

    /// Set the shutdown grace period in seconds.
    pub fn with_shutdown_grace_seconds(mut self, seconds: u64) -> Self {
        self.shutdown_grace_seconds = seconds;
        self
    }

    /// The shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EndpointConfig::default();
        assert_eq!(config.max_in_flight_outbound_calls, 100);
        assert_eq!(config.default_offset_encoding, OffsetEncoding::Utf16);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(60));
    }

    #[test]
    fn test_builders() {
        let config = EndpointConfig::new()
            .with_max_in_flight_outbound_calls(2)
            .with_default_offset_encoding(OffsetEncoding::Utf8)
            .with_shutdown_grace_seconds(1);
        assert_eq!(config.max_in_flight_outbound_calls, 2);
        assert_eq!(config.default_offset_encoding, OffsetEncoding::Utf8);
        assert_eq!(config.shutdown_grace_seconds, 1);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: EndpointConfig =
            serde_json::from_str(r#"{"max_in_flight_outbound_calls": 7}"#).unwrap();
        assert_eq!(config.max_in_flight_outbound_calls, 7);
        assert_eq!(config.default_offset_encoding, OffsetEncoding::Utf16);
    }
}
