//! Integration tests for behavior beyond the baseline happy path:
//! concurrent streams, lifecycle callbacks, and shutdown semantics.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use asoc_core::StreamOpts;
use asoc_integration_tests::fixtures::TwoNodeFixture;
use bytes::Bytes;
use tokio::sync::mpsc;

const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Two streams opened concurrently on the same session interleave on the
/// wire but each arrives at the receiver complete and in its own internal
/// order; nothing from one stream leaks into the other.
#[tokio::test]
async fn concurrent_streams_preserve_per_stream_order() {
    let fixture = TwoNodeFixture::new();
    let (tx, mut rx) = mpsc::channel(2);
    fixture.responder.on_stream(move |_peer_id, mut reader| {
        let tx = tx.clone();
        tokio::spawn(async move {
            let payload = reader.read_to_end().await;
            let _ = tx.send(payload).await;
        });
    });

    fixture.start().await;
    assert!(fixture.wait_for_session(SESSION_TIMEOUT).await);

    let payload_a = vec![0xAAu8; 3 * 1024 * 1024];
    let payload_b = vec![0xBBu8; 3 * 1024 * 1024];
    let opts = StreamOpts { chunk_size: 64 * 1024, stream_tag: None };

    let handle_a = fixture
        .initiator
        .stream(fixture.responder_id(), Bytes::from(payload_a.clone()), opts)
        .unwrap();
    let handle_b = fixture
        .initiator
        .stream(fixture.responder_id(), Bytes::from(payload_b.clone()), opts)
        .unwrap();
    assert_ne!(handle_a.stream_id(), handle_b.stream_id());
    handle_a.await;
    handle_b.await;

    let first = tokio::time::timeout(SESSION_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    let second = tokio::time::timeout(SESSION_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    let mut received = vec![first, second];
    received.sort_by_key(|payload| payload.first().copied());

    assert_eq!(received[0], payload_a);
    assert_eq!(received[1], payload_b);

    fixture.shutdown().await;
}

/// `on_peer_up` fires on both sides exactly once per session, with the
/// correct peer id, as soon as the handshake completes.
#[tokio::test]
async fn peer_up_fires_on_both_sides() {
    let fixture = TwoNodeFixture::new();
    let (initiator_tx, mut initiator_rx) = mpsc::channel(1);
    let (responder_tx, mut responder_rx) = mpsc::channel(1);
    fixture.initiator.on_peer_up(move |peer_id| {
        let _ = initiator_tx.try_send(peer_id);
    });
    fixture.responder.on_peer_up(move |peer_id| {
        let _ = responder_tx.try_send(peer_id);
    });

    fixture.start().await;
    assert!(fixture.wait_for_session(SESSION_TIMEOUT).await);

    let seen_by_initiator = tokio::time::timeout(SESSION_TIMEOUT, initiator_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let seen_by_responder = tokio::time::timeout(SESSION_TIMEOUT, responder_rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(seen_by_initiator, fixture.responder_id());
    assert_eq!(seen_by_responder, fixture.initiator_id());

    fixture.shutdown().await;
}

/// A stream queued just before `shutdown()` is either fully drained or
/// reported `Aborted` — it never hangs the caller past the configured
/// drain deadline.
#[tokio::test]
async fn shutdown_resolves_in_flight_stream() {
    let fixture = TwoNodeFixture::new();
    fixture.responder.on_stream(|_peer_id, mut reader| {
        tokio::spawn(async move {
            let _ = reader.read_to_end().await;
        });
    });

    fixture.start().await;
    assert!(fixture.wait_for_session(SESSION_TIMEOUT).await);

    let handle = fixture
        .initiator
        .stream(fixture.responder_id(), Bytes::from(vec![0x42u8; 64 * 1024]), StreamOpts::default())
        .unwrap();

    fixture.initiator.shutdown().await;
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("stream handle never resolved after shutdown");

    assert!(fixture.initiator.peers().is_empty());
    fixture.responder.shutdown().await;
}

/// `peers()` reflects a session disappearing once the remote side shuts
/// down, and `on_peer_down` fires exactly once.
#[tokio::test]
async fn peer_down_fires_once_on_remote_shutdown() {
    let fixture = TwoNodeFixture::new();
    let down_count = Arc::new(AtomicUsize::new(0));
    {
        let down_count = down_count.clone();
        fixture.initiator.on_peer_down(move |_peer_id, _reason| {
            down_count.fetch_add(1, Ordering::SeqCst);
        });
    }

    fixture.start().await;
    assert!(fixture.wait_for_session(SESSION_TIMEOUT).await);

    fixture.responder.shutdown().await;
    assert!(fixture.wait_for_initiator_disconnect(Duration::from_secs(5)).await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(down_count.load(Ordering::SeqCst), 1);

    fixture.initiator.shutdown().await;
}
