//! HELLO/ACCEPT exchange that establishes a session's identity and token.

use std::time::Duration;

use asoc_codec::{FrameHeader, FrameType};
use tokio::net::TcpStream;

use crate::connection::io::{read_frame, write_frame};
use crate::error::{ConnectionError, ProtocolViolation};
use crate::identity::NodeId;

/// Stream id reserved for handshake frames; never allocated to a stream.
const HANDSHAKE_STREAM_ID: u32 = 0;

/// Send HELLO and wait for ACCEPT, bounded by `timeout_dur`.
///
/// Returns the session token carried by ACCEPT.
pub(crate) async fn handshake_initiator(
    stream: &mut TcpStream,
    local_id: NodeId,
    api_key: &[u8],
    timeout_dur: Duration,
) -> Result<[u8; 8], ConnectionError> {
    tokio::time::timeout(timeout_dur, handshake_initiator_inner(stream, local_id, api_key))
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout)?
}

async fn handshake_initiator_inner(
    stream: &mut TcpStream,
    local_id: NodeId,
    api_key: &[u8],
) -> Result<[u8; 8], ConnectionError> {
    let challenge = asoc_crypto::random_u32().map_err(|_| ConnectionError::HandshakeFailed)?;
    let hello = asoc_codec::encode_hello(local_id.as_uuid(), challenge, api_key);

    write_frame(
        stream,
        &FrameHeader::new(FrameType::Hello, HANDSHAKE_STREAM_ID, 0, hello.len() as u32),
        &hello,
    )
    .await?;

    let (header, payload) = read_frame(stream, asoc_codec::ACCEPT_LEN as u32).await?;
    if header.frame_type != FrameType::Accept {
        return Err(ConnectionError::HandshakeFailed);
    }

    let accept = asoc_codec::verify_accept(&payload, api_key).map_err(|_| ConnectionError::HandshakeFailed)?;
    Ok(accept.token)
}

/// Wait for HELLO, validate it, and reply with ACCEPT, bounded by
/// `timeout_dur`.
///
/// `is_duplicate` reports whether the remote's claimed node id already has
/// an established session, in which case the handshake is rejected as a
/// protocol violation rather than silently replacing the existing session.
pub(crate) async fn handshake_acceptor(
    stream: &mut TcpStream,
    api_key: &[u8],
    timeout_dur: Duration,
    is_duplicate: impl Fn(NodeId) -> bool,
) -> Result<(NodeId, [u8; 8]), ConnectionError> {
    tokio::time::timeout(
        timeout_dur,
        handshake_acceptor_inner(stream, api_key, is_duplicate),
    )
    .await
    .map_err(|_| ConnectionError::HandshakeTimeout)?
}

async fn handshake_acceptor_inner(
    stream: &mut TcpStream,
    api_key: &[u8],
    is_duplicate: impl Fn(NodeId) -> bool,
) -> Result<(NodeId, [u8; 8]), ConnectionError> {
    let (header, payload) = read_frame(stream, asoc_codec::HELLO_LEN as u32).await?;
    if header.frame_type != FrameType::Hello {
        return Err(ConnectionError::HandshakeFailed);
    }

    let hello = asoc_codec::decode_and_verify_hello(&payload, api_key).map_err(|_| ConnectionError::HandshakeFailed)?;
    let remote_id = NodeId::from(hello.node_id);

    if is_duplicate(remote_id) {
        return Err(ConnectionError::ProtocolViolation(ProtocolViolation::DuplicateNodeId));
    }

    let (accept, token) = asoc_codec::generate_accept(api_key).map_err(|_| ConnectionError::HandshakeFailed)?;

    write_frame(
        stream,
        &FrameHeader::new(FrameType::Accept, HANDSHAKE_STREAM_ID, 0, accept.len() as u32),
        &accept,
    )
    .await?;

    Ok((remote_id, token))
}
