//! LSP base-protocol framing codec.
//!
//! A frame is a sequence of HTTP-style header lines terminated by a blank
//! line, followed by exactly `Content-Length` bytes of UTF-8 JSON:
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"initialize", ...}
//! ```
//!
//! `Content-Type` is accepted but ignored, as are unknown headers. A missing
//! or garbled `Content-Length` is a framing error and fatal to the session.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;
use turbolsp_protocol::Message;

use crate::error::TransportError;

/// Default cap on a single frame's payload (16 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Cap on the header section; a peer that never terminates its headers is
/// desynchronized, not just chatty.
const MAX_HEADER_BYTES: usize = 8 * 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Codec for `Content-Length` framed JSON-RPC envelopes.
#[derive(Debug)]
pub struct ContentLengthCodec {
    max_frame_bytes: usize,
    state: DecodeState,
}

#[derive(Debug)]
enum DecodeState {
    /// Waiting for a complete header section
    Header,
    /// Waiting for a payload of the given length
    Body(usize),
}

impl ContentLengthCodec {
    /// Create a codec with the default frame cap.
    pub fn new() -> Self {
        Self::with_max_frame_bytes(DEFAULT_MAX_FRAME_BYTES)
    }

    /// Create a codec with a custom frame cap.
    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            state: DecodeState::Header,
        }
    }

    fn parse_header(&self, header: &str) -> Result<usize, TransportError> {
        let mut content_length = None;
        for line in header.split("\r\n") {
            if line.is_empty() {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(TransportError::InvalidHeader(format!(
                    "header line without ':': {line:?}"
                )));
            };
            if name.trim().eq_ignore_ascii_case("content-length") {
                let length = value.trim().parse::<usize>().map_err(|_| {
                    TransportError::InvalidHeader(format!(
                        "unparseable Content-Length: {:?}",
                        value.trim()
                    ))
                })?;
                content_length = Some(length);
            }
            // Content-Type and anything else: accepted, ignored.
        }
        content_length
            .ok_or_else(|| TransportError::InvalidHeader("missing Content-Length".to_string()))
    }
}

impl Default for ContentLengthCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ContentLengthCodec {
    type Item = Message;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, TransportError> {
        loop {
            match self.state {
                DecodeState::Header => {
                    let Some(end) = src
                        .windows(HEADER_TERMINATOR.len())
                        .position(|window| window == HEADER_TERMINATOR)
                    else {
                        if src.len() > MAX_HEADER_BYTES {
                            return Err(TransportError::InvalidHeader(
                                "unterminated header section".to_string(),
                            ));
                        }
                        return Ok(None);
                    };

                    let header_bytes = src.split_to(end + HEADER_TERMINATOR.len());
                    let header = std::str::from_utf8(&header_bytes[..end]).map_err(|_| {
                        TransportError::InvalidHeader("header section is not UTF-8".to_string())
                    })?;
                    let length = self.parse_header(header)?;
                    if length > self.max_frame_bytes {
                        return Err(TransportError::FrameTooLarge {
                            length,
                            limit: self.max_frame_bytes,
                        });
                    }
                    src.reserve(length.saturating_sub(src.len()));
                    self.state = DecodeState::Body(length);
                }
                DecodeState::Body(length) => {
                    if src.len() < length {
                        return Ok(None);
                    }
                    let payload = src.split_to(length);
                    self.state = DecodeState::Header;
                    let message: Message = serde_json::from_slice(&payload)?;
                    trace!(bytes = length, "decoded inbound frame");
                    return Ok(Some(message));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>, TransportError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(TransportError::UnexpectedEof),
        }
    }
}

impl Encoder<Message> for ContentLengthCodec {
    type Error = TransportError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(&item)?;
        dst.reserve(payload.len() + 32);
        dst.put_slice(format!("Content-Length: {}\r\n\r\n", payload.len()).as_bytes());
        dst.put_slice(&payload);
        trace!(bytes = payload.len(), "encoded outbound frame");
        Ok(())
    }
}
