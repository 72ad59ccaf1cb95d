//! The receiving side of a stream: the awaitable outbound handle and the
//! inbound chunk reader handed to `on_stream` callbacks.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::identity::NodeId;
use crate::streaming::opts::StreamResult;

/// Bound on buffered-but-undelivered chunks for one inbound stream.
///
/// Once full, the frame reader's `send().await` blocks, which in turn
/// stalls that session's socket reads — the backpressure a slow
/// `on_stream` consumer applies all the way back to the wire.
const READER_CHANNEL_CAPACITY: usize = 64;

pub(crate) fn reader_channel() -> (mpsc::Sender<Bytes>, mpsc::Receiver<Bytes>) {
    mpsc::channel(READER_CHANNEL_CAPACITY)
}

/// Handle returned by [`crate::Node::stream`]. Resolves once every frame of
/// the payload, including the terminating END, has been handed to the
/// session's send queue — or `Aborted` if the session closed first.
pub struct StreamHandle {
    pub(crate) stream_id: u32,
    pub(crate) done: oneshot::Receiver<StreamResult>,
}

impl StreamHandle {
    /// The stream id allocated for this outbound transfer.
    #[must_use]
    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }
}

impl Future for StreamHandle {
    type Output = StreamResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.done)
            .poll(cx)
            .map(|result| result.unwrap_or(StreamResult::Aborted))
    }
}

/// An inbound stream's chunks, handed to the application's `on_stream`
/// callback once per stream.
///
/// Chunks are delivered in order, exactly once; [`Self::next_chunk`]
/// returns `None` at end-of-stream, whether the stream ended cleanly (an
/// END frame was observed) or the session aborted.
pub struct StreamReader {
    peer_id: NodeId,
    stream_tag: Option<u32>,
    chunks: mpsc::Receiver<Bytes>,
}

impl StreamReader {
    pub(crate) fn new(peer_id: NodeId, stream_tag: Option<u32>, chunks: mpsc::Receiver<Bytes>) -> Self {
        Self {
            peer_id,
            stream_tag,
            chunks,
        }
    }

    /// The peer this stream arrived from.
    #[must_use]
    pub fn peer_id(&self) -> NodeId {
        self.peer_id
    }

    /// The application-level tag the stream was opened with, if any.
    ///
    /// Always `None` in this implementation: the wire frame header has no
    /// field to carry it end-to-end (see [`super::StreamOpts::stream_tag`]).
    #[must_use]
    pub fn stream_tag(&self) -> Option<u32> {
        self.stream_tag
    }

    /// Receive the next chunk in sequence, or `None` at end-of-stream.
    pub async fn next_chunk(&mut self) -> Option<Bytes> {
        self.chunks.recv().await
    }

    /// Drain every remaining chunk into one contiguous buffer.
    ///
    /// Convenient for tests and small payloads; large streams should
    /// prefer [`Self::next_chunk`] to avoid buffering the whole payload.
    pub async fn read_to_end(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            buf.extend_from_slice(&chunk);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stream_handle_resolves_completed() {
        let (tx, rx) = oneshot::channel();
        tx.send(StreamResult::Completed).unwrap();
        let handle = StreamHandle { stream_id: 1, done: rx };
        assert_eq!(handle.await, StreamResult::Completed);
    }

    #[tokio::test]
    async fn stream_handle_resolves_aborted_on_drop() {
        let (tx, rx) = oneshot::channel::<StreamResult>();
        drop(tx);
        let handle = StreamHandle { stream_id: 1, done: rx };
        assert_eq!(handle.await, StreamResult::Aborted);
    }

    #[tokio::test]
    async fn reader_drains_chunks_in_order_then_ends() {
        let (tx, rx) = reader_channel();
        let mut reader = StreamReader::new(NodeId::generate(), None, rx);
        tx.send(Bytes::from_static(b"abc")).await.unwrap();
        tx.send(Bytes::from_static(b"def")).await.unwrap();
        drop(tx);

        assert_eq!(reader.read_to_end().await, b"abcdef");
    }
}
