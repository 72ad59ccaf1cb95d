//! Inbound stream reassembly: demuxes DATA/END frames by stream id and
//! enforces strict in-order sequencing, one table per session.

use std::sync::Arc;

use asoc_codec::{FrameHeader, FrameType};
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::ProtocolViolation;
use crate::identity::NodeId;
use crate::streaming::reader::{StreamReader, reader_channel};
use crate::streaming::stream_id::is_valid_inbound_parity;

/// Invoked once per inbound stream, with a reader that yields its chunks.
pub type StreamCallback = Arc<dyn Fn(NodeId, StreamReader) + Send + Sync>;

struct InboundStream {
    sender: mpsc::Sender<Bytes>,
    last_sequence: Option<u32>,
}

/// Demultiplexes one session's inbound DATA/END frames into per-stream
/// readers.
///
/// Owned by exactly one connection; never shared across sessions, so no
/// cross-session locking is required. The reassembler holds no reference
/// back to the connection — it is driven by the connection's frame reader
/// and only ever produces readers for the application, breaking the
/// connection/stream ownership cycle.
pub struct Reassembler {
    peer_id: NodeId,
    local_is_initiator: bool,
    streams: DashMap<u32, InboundStream>,
    callback: Option<StreamCallback>,
}

impl Reassembler {
    /// Create a reassembler for one session. `local_is_initiator` decides
    /// which stream id parity is valid for frames arriving from the
    /// remote (the remote always allocates the opposite parity).
    #[must_use]
    pub fn new(peer_id: NodeId, local_is_initiator: bool, callback: Option<StreamCallback>) -> Self {
        Self {
            peer_id,
            local_is_initiator,
            streams: DashMap::new(),
            callback,
        }
    }

    /// Route one inbound DATA or END frame. Any other frame type reaching
    /// here is a protocol violation on the caller's part.
    pub async fn on_frame(&self, header: &FrameHeader, payload: Bytes) -> Result<(), ProtocolViolation> {
        match header.frame_type {
            FrameType::Data => self.on_data(header.stream_id, header.sequence, payload).await,
            FrameType::End => self.on_end(header.stream_id, header.sequence).await,
            _ => Err(ProtocolViolation::ControlOnDataPhase),
        }
    }

    async fn on_data(&self, stream_id: u32, sequence: u32, payload: Bytes) -> Result<(), ProtocolViolation> {
        let sender = if let Some(mut entry) = self.streams.get_mut(&stream_id) {
            let expected = entry.last_sequence.map_or(0, |s| s + 1);
            if sequence != expected {
                return Err(ProtocolViolation::SequenceGap);
            }
            entry.last_sequence = Some(sequence);
            entry.sender.clone()
        } else {
            self.open_stream(stream_id, sequence)?
        };

        // The application may have dropped its reader; that just discards
        // the chunk rather than tearing down the whole session.
        let _ = sender.send(payload).await;
        Ok(())
    }

    async fn on_end(&self, stream_id: u32, sequence: u32) -> Result<(), ProtocolViolation> {
        if let Some((_, entry)) = self.streams.remove(&stream_id) {
            let expected = entry.last_sequence.map_or(0, |s| s + 1);
            if sequence != expected {
                return Err(ProtocolViolation::SequenceGap);
            }
            // Dropping `entry.sender` here closes the reader's channel,
            // which is the reader's end-of-stream signal.
            Ok(())
        } else {
            // A zero-length payload: END is the very first frame seen.
            self.open_stream(stream_id, sequence)?;
            self.streams.remove(&stream_id);
            Ok(())
        }
    }

    /// First sighting of `stream_id`: validate its parity and starting
    /// sequence, create its reader, and hand it to the callback.
    fn open_stream(&self, stream_id: u32, sequence: u32) -> Result<mpsc::Sender<Bytes>, ProtocolViolation> {
        if !is_valid_inbound_parity(stream_id, self.local_is_initiator) {
            return Err(ProtocolViolation::UnknownStreamParity);
        }
        if sequence != 0 {
            return Err(ProtocolViolation::SequenceGap);
        }

        let (tx, rx) = reader_channel();
        self.streams.insert(
            stream_id,
            InboundStream {
                sender: tx.clone(),
                last_sequence: Some(0),
            },
        );
        if let Some(callback) = &self.callback {
            callback(self.peer_id, StreamReader::new(self.peer_id, None, rx));
        }
        Ok(tx)
    }

    /// Abort every open inbound stream (session close or fatal error).
    /// Dropping each stream's sender closes its reader's channel, which
    /// the application observes as an unexpected end-of-stream.
    pub fn abort_all(&self) {
        self.streams.clear();
    }
}
