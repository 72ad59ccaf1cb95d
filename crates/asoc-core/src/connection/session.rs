//! An established session's reader/writer loops and their shared state.

use std::sync::Arc;
use std::time::Duration;

use asoc_codec::FrameType;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Notify, mpsc};

use crate::connection::io::{read_frame, write_frame};
use crate::error::{ConnectionError, PeerDownReason, ProtocolViolation};
use crate::identity::NodeId;
use crate::streaming::{OutboundFrame, Reassembler, StreamIdAllocator};

/// Fixed configuration an established session is run with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionContext {
    pub(crate) max_frame_bytes: u32,
    pub(crate) idle_timeout: Duration,
    pub(crate) send_drain_timeout: Duration,
}

/// The live, running session: what [`crate::Node`] holds to address a
/// connected peer.
pub(crate) struct ActiveSession {
    pub(crate) peer_id: NodeId,
    pub(crate) is_initiator: bool,
    /// Issued during ACCEPT; retained for diagnostics but never used to
    /// authenticate data-phase frames (see spec glossary: "Session
    /// token").
    #[allow(dead_code)]
    pub(crate) session_token: [u8; 8],
    pub(crate) send_tx: mpsc::Sender<OutboundFrame>,
    pub(crate) stream_allocator: StreamIdAllocator,
    pub(crate) shutdown: Arc<Notify>,
}

/// Bound on frames queued for send before backpressure kicks in; applies
/// equally to every stream sharing this session, giving fairness "for
/// free" via FIFO delivery order rather than a custom scheduler.
const SEND_QUEUE_CAPACITY: usize = 128;

pub(crate) fn send_queue() -> (mpsc::Sender<OutboundFrame>, mpsc::Receiver<OutboundFrame>) {
    mpsc::channel(SEND_QUEUE_CAPACITY)
}

/// Drive one established session until it closes, either because the
/// remote hung up, a protocol violation was observed, or the node is
/// shutting down.
pub(crate) async fn run_session(
    stream: TcpStream,
    ctx: SessionContext,
    send_rx: mpsc::Receiver<OutboundFrame>,
    reassembler: Arc<Reassembler>,
    shutdown: Arc<Notify>,
) -> PeerDownReason {
    let (read_half, write_half) = stream.into_split();

    let reader_handle = tokio::spawn(reader_loop(read_half, ctx, reassembler.clone()));
    let writer_handle = tokio::spawn(writer_loop(write_half, send_rx, shutdown.clone(), ctx.send_drain_timeout));

    let reason = tokio::select! {
        result = reader_handle => {
            writer_handle.abort();
            match result {
                Ok(reason) => reason,
                Err(_) => PeerDownReason::Aborted,
            }
        }
        _ = writer_handle => {
            reader_handle.abort();
            PeerDownReason::Aborted
        }
    };

    reassembler.abort_all();
    reason
}

async fn reader_loop(
    mut read_half: OwnedReadHalf,
    ctx: SessionContext,
    reassembler: Arc<Reassembler>,
) -> PeerDownReason {
    loop {
        let frame = match tokio::time::timeout(ctx.idle_timeout, read_frame(&mut read_half, ctx.max_frame_bytes)).await
        {
            Ok(result) => result,
            Err(_) => return PeerDownReason::TransportError,
        };

        let (header, payload) = match frame {
            Ok(frame) => frame,
            Err(ConnectionError::ProtocolViolation(violation)) => return PeerDownReason::ProtocolViolation(violation),
            Err(_) => return PeerDownReason::TransportError,
        };

        match header.frame_type {
            FrameType::Data | FrameType::End => {
                if header.stream_id == 0 {
                    return PeerDownReason::ProtocolViolation(ProtocolViolation::ControlOnDataPhase);
                }
                if let Err(violation) = reassembler.on_frame(&header, payload).await {
                    return PeerDownReason::ProtocolViolation(violation);
                }
            }
            FrameType::Control => {
                // Reserved for future use; established sessions don't emit
                // it yet, so silently ignore rather than treat as fatal.
            }
            FrameType::Hello | FrameType::Accept => {
                return PeerDownReason::ProtocolViolation(ProtocolViolation::ControlOnDataPhase);
            }
        }
    }
}

async fn writer_loop(
    mut write_half: OwnedWriteHalf,
    mut send_rx: mpsc::Receiver<OutboundFrame>,
    shutdown: Arc<Notify>,
    send_drain_timeout: Duration,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.notified() => {
                let _ = tokio::time::timeout(send_drain_timeout, drain(&mut write_half, &mut send_rx)).await;
                return;
            }
            frame = send_rx.recv() => {
                match frame {
                    Some((header, payload)) => {
                        if write_frame(&mut write_half, &header, &payload).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                }
            }
        }
    }
}

/// Flush whatever is already queued (or arrives while draining) until the
/// sender side closes, up to the caller's timeout.
async fn drain(write_half: &mut OwnedWriteHalf, send_rx: &mut mpsc::Receiver<OutboundFrame>) {
    while let Some((header, payload)) = send_rx.recv().await {
        if write_frame(write_half, &header, &payload).await.is_err() {
            return;
        }
    }
}
