//! Frame-level read/write helpers shared by the handshake and the
//! established-session reader/writer loops.

use asoc_codec::{FrameHeader, decode_frame_header, encode_frame_header};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ConnectionError, ProtocolViolation};

/// Write one frame (header followed by payload) and flush.
pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    header: &FrameHeader,
    payload: &[u8],
) -> Result<(), ConnectionError> {
    let encoded = encode_frame_header(header);
    writer
        .write_all(&encoded)
        .await
        .map_err(|source| ConnectionError::Transport(asoc_transport::TransportError::Io(source)))?;
    if !payload.is_empty() {
        writer
            .write_all(payload)
            .await
            .map_err(|source| ConnectionError::Transport(asoc_transport::TransportError::Io(source)))?;
    }
    writer
        .flush()
        .await
        .map_err(|source| ConnectionError::Transport(asoc_transport::TransportError::Io(source)))?;
    Ok(())
}

/// Read one frame, rejecting any payload length beyond `max_frame_bytes`
/// before it is read off the wire.
pub(crate) async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_bytes: u32,
) -> Result<(FrameHeader, Bytes), ConnectionError> {
    let mut header_buf = [0u8; asoc_codec::FRAME_HEADER_LEN];
    reader
        .read_exact(&mut header_buf)
        .await
        .map_err(|source| ConnectionError::Transport(asoc_transport::TransportError::Io(source)))?;
    let header = decode_frame_header(&header_buf)?;

    if header.payload_len > max_frame_bytes {
        return Err(ConnectionError::ProtocolViolation(ProtocolViolation::OversizedFrame));
    }

    let mut payload = BytesMut::zeroed(header.payload_len as usize);
    if !payload.is_empty() {
        reader
            .read_exact(&mut payload)
            .await
            .map_err(|source| ConnectionError::Transport(asoc_transport::TransportError::Io(source)))?;
    }

    Ok((header, payload.freeze()))
}
