//! Standard I/O transport.
//!
//! The common LSP deployment: frames arrive on stdin and replies leave on
//! stdout (stderr stays free for logging). [`StdioTransport::from_raw`]
//! accepts any `AsyncRead`/`AsyncWrite` pair, which is how tests run the
//! endpoint over `tokio::io::duplex` pipes and how an embedder wires up a
//! socket or a child process.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::codec::{FramedRead, FramedWrite};
use turbolsp_protocol::Message;

use crate::codec::ContentLengthCodec;
use crate::error::TransportResult;
use crate::traits::{MessageSink, MessageStream, Transport};

// Boxed async I/O so one transport type covers process stdio, sockets, and
// in-memory pipes.
type BoxedAsyncRead = Pin<Box<dyn AsyncRead + Send + Sync + 'static>>;
type BoxedAsyncWrite = Pin<Box<dyn AsyncWrite + Send + Sync + 'static>>;

/// Read half: framed decoding over a buffered reader.
pub struct FrameReader {
    inner: FramedRead<BufReader<BoxedAsyncRead>, ContentLengthCodec>,
}

/// Write half: framed encoding, flushed per frame.
pub struct FrameWriter {
    inner: FramedWrite<BoxedAsyncWrite, ContentLengthCodec>,
}

#[async_trait]
impl MessageStream for FrameReader {
    async fn recv(&mut self) -> Option<TransportResult<Message>> {
        self.inner.next().await
    }
}

#[async_trait]
impl MessageSink for FrameWriter {
    async fn send(&mut self, message: Message) -> TransportResult<()> {
        self.inner.send(message).await
    }
}

/// Transport over stdin/stdout or any raw async stream pair.
pub struct StdioTransport {
    reader: FrameReader,
    writer: FrameWriter,
}

impl StdioTransport {
    /// Create a transport over the current process's stdin/stdout.
    pub fn new() -> Self {
        Self::from_raw(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Create a transport over raw async streams.
    ///
    /// `reader` is where frames arrive (e.g. a child's stdout, or one end of
    /// an in-memory duplex pipe); `writer` is where frames leave.
    pub fn from_raw<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Sync + 'static,
        W: AsyncWrite + Send + Sync + 'static,
    {
        let boxed_reader: BoxedAsyncRead = Box::pin(reader);
        let boxed_writer: BoxedAsyncWrite = Box::pin(writer);
        Self {
            reader: FrameReader {
                inner: FramedRead::new(BufReader::new(boxed_reader), ContentLengthCodec::new()),
            },
            writer: FrameWriter {
                inner: FramedWrite::new(boxed_writer, ContentLengthCodec::new()),
            },
        }
    }

    /// Replace the default frame cap on both halves.
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        *self.reader.inner.decoder_mut() =
            ContentLengthCodec::with_max_frame_bytes(max_frame_bytes);
        *self.writer.inner.encoder_mut() =
            ContentLengthCodec::with_max_frame_bytes(max_frame_bytes);
        self
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StdioTransport {
    type Reader = FrameReader;
    type Writer = FrameWriter;

    fn into_split(self) -> (FrameReader, FrameWriter) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbolsp_protocol::{Notification, Request, RequestId};

    #[tokio::test]
    async fn test_roundtrip_over_duplex_pipe() {
        let (near, far) = tokio::io::duplex(4096);
        let (near_read, near_write) = tokio::io::split(near);
        let (far_read, far_write) = tokio::io::split(far);

        let (mut near_rx, mut near_tx) =
            StdioTransport::from_raw(near_read, near_write).into_split();
        let (mut far_rx, mut far_tx) = StdioTransport::from_raw(far_read, far_write).into_split();

        near_tx
            .send(Message::from(Request::new(5, "textDocument/definition", None)))
            .await
            .unwrap();
        match far_rx.recv().await.unwrap().unwrap() {
            Message::Request(call) => {
                assert_eq!(call.id, RequestId::Number(5));
                assert_eq!(call.method, "textDocument/definition");
            }
            other => panic!("expected request, got {other:?}"),
        }

        far_tx
            .send(Message::from(Notification::new("window/logMessage", None)))
            .await
            .unwrap();
        assert!(matches!(
            near_rx.recv().await.unwrap().unwrap(),
            Message::Notification(_)
        ));
    }

    #[tokio::test]
    async fn test_recv_returns_none_at_eof() {
        let (near, far) = tokio::io::duplex(64);
        let (far_read, _far_write) = tokio::io::split(far);
        let (mut far_rx, _far_tx_keep) =
            StdioTransport::from_raw(far_read, tokio::io::sink()).into_split();

        drop(near); // peer hangs up
        assert!(far_rx.recv().await.is_none());
    }
}
