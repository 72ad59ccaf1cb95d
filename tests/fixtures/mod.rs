//! Two-node test fixture for integration testing.
//!
//! Provides reusable infrastructure for the end-to-end scenarios in the
//! integration suite: session establishment, streaming, reconnection and
//! discovery.
//!
//! # Example
//!
//! ```no_run
//! use asoc_integration_tests::fixtures::TwoNodeFixture;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fixture = TwoNodeFixture::new();
//!     fixture.start().await;
//!     fixture.wait_for_session(std::time::Duration::from_secs(5)).await;
//! }
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use asoc_core::{Node, NodeConfig, NodeId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use uuid::Uuid;

/// Shared API key for the test community. 16 bytes is the protocol minimum.
pub const TEST_API_KEY: &[u8] = b"integration-test-api-key-32bytes";
/// Community string shared by every fixture-created node.
pub const TEST_COMMUNITY: &str = "asoc-integration-tests";

/// Global port allocator so concurrently-running tests never collide.
static NEXT_PORT: AtomicU16 = AtomicU16::new(21000);

/// Allocate a block of `count` contiguous, presumed-free ports.
fn allocate_ports(count: u16) -> u16 {
    NEXT_PORT.fetch_add(count, Ordering::SeqCst)
}

fn test_config(port: u16, discovery_port: u16) -> NodeConfig {
    let mut config = NodeConfig::new(TEST_COMMUNITY, TEST_API_KEY.to_vec());
    config.port = port;
    config.discovery_port = discovery_port;
    config.enable_discovery = false;
    config.handshake_timeout = Duration::from_secs(2);
    config.connect_timeout = Duration::from_secs(2);
    config.idle_timeout = Duration::from_secs(5);
    config.send_drain_timeout = Duration::from_millis(200);
    config
}

/// A pair of nodes on loopback, wired together either by a static peer
/// entry or by discovery, depending on how the fixture is built.
pub struct TwoNodeFixture {
    /// The node that dials out (or advertises a static peer).
    pub initiator: Node,
    /// The node that accepts the inbound connection.
    pub responder: Node,
    /// The responder's bound address, as seen by the initiator.
    pub responder_addr: SocketAddr,
}

impl TwoNodeFixture {
    /// Build a fixture where the initiator has the responder configured as
    /// a static peer; discovery is disabled on both sides.
    #[must_use]
    pub fn new() -> Self {
        crate::test_helpers::init_tracing();
        let base_port = allocate_ports(4);
        let initiator_port = base_port;
        let responder_port = base_port + 1;
        let discovery_port = base_port + 2;
        let responder_addr: SocketAddr = format!("127.0.0.1:{responder_port}").parse().unwrap();

        let mut initiator_config = test_config(initiator_port, discovery_port);
        initiator_config.static_peers = vec![responder_addr];
        let responder_config = test_config(responder_port, discovery_port);

        Self {
            initiator: Node::new(initiator_config).unwrap(),
            responder: Node::new(responder_config).unwrap(),
            responder_addr,
        }
    }

    /// Start the responder first, then the initiator, so the static peer
    /// loop has something to connect to immediately.
    pub async fn start(&self) {
        self.responder.start().await.unwrap();
        self.initiator.start().await.unwrap();
    }

    /// Start only the initiator; useful for reconnect tests that bring the
    /// responder up later.
    pub async fn start_initiator_only(&self) {
        self.initiator.start().await.unwrap();
    }

    /// Poll until both sides report an established session, or the timeout
    /// elapses.
    pub async fn wait_for_session(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                if !self.initiator.peers().is_empty() && !self.responder.peers().is_empty() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Poll until the initiator's session with `responder` disappears, or
    /// the timeout elapses.
    pub async fn wait_for_initiator_disconnect(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                if self.initiator.peers().is_empty() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .is_ok()
    }

    /// The responder's id, as seen from the initiator's session table.
    #[must_use]
    pub fn responder_id(&self) -> NodeId {
        self.initiator.peers()[0]
    }

    /// The initiator's id, as seen from the responder's session table.
    #[must_use]
    pub fn initiator_id(&self) -> NodeId {
        self.responder.peers()[0]
    }

    /// Shut down both nodes.
    pub async fn shutdown(self) {
        self.initiator.shutdown().await;
        self.responder.shutdown().await;
    }
}

impl Default for TwoNodeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a pair of bare configs sharing community/API key but with distinct
/// ports, for tests that construct [`Node`]s directly rather than through
/// [`TwoNodeFixture`].
#[must_use]
pub fn config_pair() -> (NodeConfig, NodeConfig) {
    crate::test_helpers::init_tracing();
    let base_port = allocate_ports(4);
    (
        test_config(base_port, base_port + 2),
        test_config(base_port + 1, base_port + 2),
    )
}

/// Complete the initiator side of the HELLO/ACCEPT handshake directly
/// against a listening [`Node`], bypassing `asoc_core`'s own handshake
/// implementation entirely.
///
/// Lets hardening tests drive a real session with frames the real `Node`
/// would never construct, to exercise the responder's fault handling.
pub async fn raw_handshake(addr: SocketAddr, api_key: &[u8]) -> TcpStream {
    let mut stream = asoc_transport::connect(addr, Duration::from_secs(2)).await.unwrap();

    let node_id = Uuid::new_v4();
    let challenge = asoc_crypto::random_u32().unwrap();
    let hello = asoc_codec::encode_hello(node_id, challenge, api_key);
    let header = asoc_codec::FrameHeader::new(asoc_codec::FrameType::Hello, 0, 0, hello.len() as u32);
    stream.write_all(&asoc_codec::encode_frame_header(&header)).await.unwrap();
    stream.write_all(&hello).await.unwrap();
    stream.flush().await.unwrap();

    let mut response_header = [0u8; asoc_codec::FRAME_HEADER_LEN];
    stream.read_exact(&mut response_header).await.unwrap();
    let header = asoc_codec::decode_frame_header(&response_header).unwrap();
    assert_eq!(header.frame_type, asoc_codec::FrameType::Accept);

    let mut payload = vec![0u8; header.payload_len as usize];
    stream.read_exact(&mut payload).await.unwrap();
    asoc_codec::verify_accept(&payload, api_key).unwrap();

    stream
}

/// Like [`raw_handshake`], but surfaces a HELLO signed with `hello_key`
/// while the caller separately controls which key is used to verify the
/// resulting ACCEPT, for tests that deliberately mismatch keys.
///
/// Returns `Err(())` if the acceptor closes the connection (or the
/// handshake otherwise fails) instead of sending ACCEPT.
pub async fn try_raw_handshake(addr: SocketAddr, hello_key: &[u8]) -> Result<TcpStream, ()> {
    let mut stream = asoc_transport::connect(addr, Duration::from_secs(2)).await.map_err(|_| ())?;

    let node_id = Uuid::new_v4();
    let challenge = asoc_crypto::random_u32().map_err(|_| ())?;
    let hello = asoc_codec::encode_hello(node_id, challenge, hello_key);
    let header = asoc_codec::FrameHeader::new(asoc_codec::FrameType::Hello, 0, 0, hello.len() as u32);
    stream
        .write_all(&asoc_codec::encode_frame_header(&header))
        .await
        .map_err(|_| ())?;
    stream.write_all(&hello).await.map_err(|_| ())?;
    stream.flush().await.map_err(|_| ())?;

    let mut response_header = [0u8; asoc_codec::FRAME_HEADER_LEN];
    stream.read_exact(&mut response_header).await.map_err(|_| ())?;
    Ok(stream)
}

/// Send a single raw DATA or END frame over an already-handshaken stream.
pub async fn send_raw_frame(stream: &mut TcpStream, frame_type: asoc_codec::FrameType, stream_id: u32, sequence: u32, payload: &[u8]) {
    let header = asoc_codec::FrameHeader::new(frame_type, stream_id, sequence, payload.len() as u32);
    stream.write_all(&asoc_codec::encode_frame_header(&header)).await.unwrap();
    if !payload.is_empty() {
        stream.write_all(payload).await.unwrap();
    }
    stream.flush().await.unwrap();
}
