//! Frame header encoding and decoding.
//!
//! The frame header is the fixed 14-byte prefix of every protocol unit
//! exchanged on an established (or handshaking) session. All multi-byte
//! integers are big-endian.
//!
//! ```text
//! offset  size  field
//! 0       1     high nibble = version (1), low nibble = frame type
//! 1       4     stream id
//! 5       4     sequence
//! 9       4     payload length
//! ```

use crate::error::CodecError;

/// Current (and only supported) wire protocol version.
pub const VERSION: u8 = 1;

/// Encoded size of a frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 14;

/// Frame types carried in the low nibble of byte 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// A chunk of stream payload.
    Data = 1,
    /// Terminates a stream.
    End = 2,
    /// Reserved for future control-plane use.
    Control = 3,
    /// Handshake: initiator -> acceptor.
    Hello = 4,
    /// Handshake: acceptor -> initiator.
    Accept = 5,
}

impl TryFrom<u8> for FrameType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Data),
            2 => Ok(Self::End),
            3 => Ok(Self::Control),
            4 => Ok(Self::Hello),
            5 => Ok(Self::Accept),
            other => Err(CodecError::UnknownType(other)),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(value: FrameType) -> Self {
        value as u8
    }
}

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Frame type.
    pub frame_type: FrameType,
    /// Stream id this frame belongs to (0 is reserved for the handshake).
    pub stream_id: u32,
    /// Sequence number within the stream.
    pub sequence: u32,
    /// Length of the payload that follows the header, in bytes.
    pub payload_len: u32,
}

impl FrameHeader {
    /// Construct a new header for encoding.
    #[must_use]
    pub fn new(frame_type: FrameType, stream_id: u32, sequence: u32, payload_len: u32) -> Self {
        Self {
            frame_type,
            stream_id,
            sequence,
            payload_len,
        }
    }
}

/// Encode a frame header into its fixed 14-byte wire representation.
#[must_use]
pub fn encode_frame_header(header: &FrameHeader) -> [u8; FRAME_HEADER_LEN] {
    let mut out = [0u8; FRAME_HEADER_LEN];
    out[0] = (VERSION << 4) | (u8::from(header.frame_type) & 0x0F);
    out[1..5].copy_from_slice(&header.stream_id.to_be_bytes());
    out[5..9].copy_from_slice(&header.sequence.to_be_bytes());
    out[9..13].copy_from_slice(&header.payload_len.to_be_bytes());
    // Byte 13 is currently unused; reserved for future alignment/flags.
    out
}

/// Decode and validate a frame header from the front of `buf`.
///
/// Does not require `buf` to contain the payload as well; only the first
/// [`FRAME_HEADER_LEN`] bytes are consulted.
pub fn decode_frame_header(buf: &[u8]) -> Result<FrameHeader, CodecError> {
    if buf.len() < FRAME_HEADER_LEN {
        return Err(CodecError::ShortBuffer {
            expected: FRAME_HEADER_LEN,
            actual: buf.len(),
        });
    }

    let version = buf[0] >> 4;
    if version != VERSION {
        return Err(CodecError::BadVersion(version));
    }

    let frame_type = FrameType::try_from(buf[0] & 0x0F)?;
    let stream_id = u32::from_be_bytes(buf[1..5].try_into().unwrap());
    let sequence = u32::from_be_bytes(buf[5..9].try_into().unwrap());
    let payload_len = u32::from_be_bytes(buf[9..13].try_into().unwrap());

    Ok(FrameHeader {
        frame_type,
        stream_id,
        sequence,
        payload_len,
    })
}
