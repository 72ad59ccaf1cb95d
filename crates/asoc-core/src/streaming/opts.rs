//! Options and outcomes for a single outbound stream.

use crate::config::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::error::StreamError;

/// Default chunk size used when [`StreamOpts::default`] is not overridden.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// The fixed set of options accepted by [`crate::Node::stream`].
#[derive(Debug, Clone, Copy)]
pub struct StreamOpts {
    /// Size of each DATA frame's payload, in bytes. Must fall within
    /// `4 KiB..=16 MiB`. The last chunk of a payload may be smaller.
    pub chunk_size: usize,
    /// Optional 32-bit application label.
    ///
    /// The wire frame header has no field to carry this (§6: "no padding,
    /// no alignment, no optional fields"), so it is retained purely as
    /// local bookkeeping for the caller that initiated the stream; it is
    /// not transmitted to the remote peer. See `DESIGN.md` for the
    /// reasoning.
    pub stream_tag: Option<u32>,
}

impl Default for StreamOpts {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            stream_tag: None,
        }
    }
}

impl StreamOpts {
    /// Validate `chunk_size` against the accepted range, synchronously, at
    /// the `stream()` call site.
    pub fn validate(&self) -> Result<(), StreamError> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(StreamError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }
}

/// Outcome of an outbound stream, delivered through its [`super::StreamHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamResult {
    /// Every frame, including the terminating END, was handed to the
    /// session's send queue.
    Completed,
    /// The session closed (or the node shut down) before the stream
    /// finished being queued.
    Aborted,
}
