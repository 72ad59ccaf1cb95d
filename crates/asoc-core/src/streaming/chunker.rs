//! Splits an outbound payload into an ordered sequence of DATA frames
//! followed by exactly one terminating END frame.

use asoc_codec::{FrameHeader, FrameType};
use bytes::Bytes;

/// One outbound frame: its header, and the payload bytes (empty for END).
pub type OutboundFrame = (FrameHeader, Bytes);

/// Build the ordered frames for one outbound stream.
///
/// A zero-length payload produces zero DATA frames followed immediately by
/// an END frame at sequence 0. Otherwise the payload is split into
/// `chunk_size`-sized DATA frames (the last chunk may be smaller), with
/// sequence numbers `0, 1, 2, …`, followed by an END frame whose sequence
/// is one greater than the last DATA frame's.
#[must_use]
pub fn build_frames(stream_id: u32, payload: Bytes, chunk_size: usize) -> Vec<OutboundFrame> {
    debug_assert!(chunk_size > 0, "chunk_size must be validated before chunking");

    let mut frames = Vec::with_capacity(payload.len() / chunk_size.max(1) + 2);
    let mut sequence = 0u32;
    let mut offset = 0usize;

    while offset < payload.len() {
        let end = (offset + chunk_size).min(payload.len());
        let chunk = payload.slice(offset..end);
        frames.push((
            FrameHeader::new(FrameType::Data, stream_id, sequence, chunk.len() as u32),
            chunk,
        ));
        sequence += 1;
        offset = end;
    }

    frames.push((
        FrameHeader::new(FrameType::End, stream_id, sequence, 0),
        Bytes::new(),
    ));

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_payload_is_just_end() {
        let frames = build_frames(1, Bytes::new(), 1024);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0.frame_type, FrameType::End);
        assert_eq!(frames[0].0.sequence, 0);
        assert_eq!(frames[0].0.stream_id, 1);
    }

    #[test]
    fn splits_large_payload_with_trailing_end() {
        let payload = Bytes::from(vec![0xAB; 7 * 1024 * 1024]);
        let frames = build_frames(3, payload.clone(), 1024 * 1024);

        assert_eq!(frames.len(), 8);
        for (i, (header, chunk)) in frames.iter().take(7).enumerate() {
            assert_eq!(header.frame_type, FrameType::Data);
            assert_eq!(header.stream_id, 3);
            assert_eq!(header.sequence, i as u32);
            assert_eq!(chunk.len(), 1024 * 1024);
        }
        assert_eq!(frames[7].0.frame_type, FrameType::End);
        assert_eq!(frames[7].0.sequence, 7);

        let reassembled: Vec<u8> = frames
            .iter()
            .take(7)
            .flat_map(|(_, chunk)| chunk.to_vec())
            .collect();
        assert_eq!(reassembled, payload.to_vec());
    }

    #[test]
    fn last_chunk_may_be_smaller() {
        let payload = Bytes::from(vec![1u8; 10]);
        let frames = build_frames(1, payload, 4);
        // 4, 4, 2 bytes -> 3 DATA frames + END
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].1.len(), 4);
        assert_eq!(frames[1].1.len(), 4);
        assert_eq!(frames[2].1.len(), 2);
        assert_eq!(frames[3].0.frame_type, FrameType::End);
        assert_eq!(frames[3].0.sequence, 3);
    }
}
