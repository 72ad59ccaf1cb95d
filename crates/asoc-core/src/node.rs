//! The public `Node` API: orchestrates discovery, connection and
//! streaming into a single handle.

use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, oneshot};
use tokio::task::JoinHandle;

use asoc_discovery::DiscoveryManager;
use asoc_transport::SessionListener;

use crate::config::NodeConfig;
use crate::connection::{ActiveSession, SessionContext, handshake_acceptor, handshake_initiator, run_session, send_queue};
use crate::error::{ConnectionError, NodeError, NodeResult, PeerDownReason, StreamError};
use crate::identity::NodeId;
use crate::streaming::{self, Reassembler, StreamCallback, StreamHandle, StreamOpts, StreamReader, StreamResult};

type PeerUpCallback = Arc<dyn Fn(NodeId) + Send + Sync>;
type PeerDownCallback = Arc<dyn Fn(NodeId, PeerDownReason) + Send + Sync>;

struct NodeInner {
    node_id: NodeId,
    config: NodeConfig,
    sessions: DashMap<NodeId, Arc<ActiveSession>>,
    discovery: Mutex<Option<Arc<DiscoveryManager>>>,
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
    stream_callback: RwLock<Option<StreamCallback>>,
    peer_up_callback: RwLock<Option<PeerUpCallback>>,
    peer_down_callback: RwLock<Option<PeerDownCallback>>,
}

/// A node participating in a cluster: owns discovery, one session per
/// established peer, and the streaming engine above them.
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    /// Construct a node from a fully-specified configuration. Validates
    /// the configuration but does not bind any sockets yet; call
    /// [`Self::start`] for that.
    pub fn new(config: NodeConfig) -> NodeResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(NodeInner {
                node_id: NodeId::generate(),
                config,
                sessions: DashMap::new(),
                discovery: Mutex::new(None),
                background_tasks: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                stream_callback: RwLock::new(None),
                peer_up_callback: RwLock::new(None),
                peer_down_callback: RwLock::new(None),
            }),
        })
    }

    /// Convenience constructor taking only the two required fields, with
    /// every other option defaulted.
    pub fn with_defaults(community: impl Into<String>, api_key: impl Into<Vec<u8>>) -> NodeResult<Self> {
        Self::new(NodeConfig::new(community, api_key))
    }

    /// This node's identity, stable for the process lifetime.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.inner.node_id
    }

    /// Register the callback invoked once per inbound stream.
    pub fn on_stream<F>(&self, callback: F)
    where
        F: Fn(NodeId, StreamReader) + Send + Sync + 'static,
    {
        *self.inner.stream_callback.write().unwrap() = Some(Arc::new(callback));
    }

    /// Register the callback invoked when a session reaches ESTABLISHED.
    pub fn on_peer_up<F>(&self, callback: F)
    where
        F: Fn(NodeId) + Send + Sync + 'static,
    {
        *self.inner.peer_up_callback.write().unwrap() = Some(Arc::new(callback));
    }

    /// Register the callback invoked when a session closes.
    pub fn on_peer_down<F>(&self, callback: F)
    where
        F: Fn(NodeId, PeerDownReason) + Send + Sync + 'static,
    {
        *self.inner.peer_down_callback.write().unwrap() = Some(Arc::new(callback));
    }

    /// Bind the data-port listener, start discovery (unless disabled), and
    /// begin connecting to static peers and newly-discovered ones.
    pub async fn start(&self) -> NodeResult<()> {
        self.inner.running.store(true, Ordering::SeqCst);

        let bind_addr = std::net::SocketAddr::new(
            std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            self.inner.config.port,
        );
        let listener = SessionListener::bind(bind_addr).await?;
        let accept_handle = {
            let node = self.clone();
            tokio::spawn(async move { node.run_accept_loop(listener).await })
        };

        let discovery_config = asoc_discovery::config::DiscoveryConfig {
            community: self.inner.config.community.clone(),
            api_key: self.inner.config.api_key.clone(),
            advertised_port: self.inner.config.port,
            discovery_port: self.inner.config.discovery_port,
            enable_discovery: self.inner.config.enable_discovery,
            static_peers: self.inner.config.static_peers.clone(),
            broadcast_interval: self.inner.config.broadcast_interval,
            peer_ttl: self.inner.config.peer_ttl,
            timestamp_skew: asoc_discovery::DiscoveryConfig::DEFAULT_TIMESTAMP_SKEW,
        };
        let discovery = DiscoveryManager::start(self.inner.node_id.as_uuid(), discovery_config).await?;
        *self.inner.discovery.lock().await = Some(discovery.clone());

        let bridge_handle = {
            let node = self.clone();
            let discovery = discovery.clone();
            tokio::spawn(async move { node.run_discovery_bridge(discovery).await })
        };

        let mut background_tasks = vec![accept_handle, bridge_handle];
        for &addr in &self.inner.config.static_peers {
            let node = self.clone();
            background_tasks.push(tokio::spawn(async move { node.static_peer_loop(addr).await }));
        }
        self.inner.background_tasks.lock().await.extend(background_tasks);

        Ok(())
    }

    /// Signal every session to drain and close, stop discovery, and abort
    /// all background tasks. Idempotent.
    pub async fn shutdown(&self) {
        self.inner.running.store(false, Ordering::SeqCst);

        for task in self.inner.background_tasks.lock().await.drain(..) {
            task.abort();
        }
        if let Some(discovery) = self.inner.discovery.lock().await.take() {
            discovery.stop().await;
        }

        for entry in self.inner.sessions.iter() {
            entry.value().shutdown.notify_one();
        }
        tokio::time::sleep(self.inner.config.send_drain_timeout + Duration::from_millis(100)).await;
        self.inner.sessions.clear();
    }

    /// The peers with a currently established session.
    #[must_use]
    pub fn peers(&self) -> Vec<NodeId> {
        self.inner.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Enqueue `payload` for delivery to `peer_id` on its established
    /// session. Fails synchronously if no such session exists or `opts` is
    /// invalid.
    pub fn stream(&self, peer_id: NodeId, payload: impl Into<Bytes>, opts: StreamOpts) -> Result<StreamHandle, StreamError> {
        opts.validate()?;
        let session = self.inner.sessions.get(&peer_id).ok_or(StreamError::NoSession)?;
        let session = session.clone();
        let stream_id = session.stream_allocator.allocate();
        let payload = payload.into();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let frames = streaming::build_frames(stream_id, payload, opts.chunk_size);
            let mut completed = true;
            for frame in frames {
                if session.send_tx.send(frame).await.is_err() {
                    completed = false;
                    break;
                }
            }
            session.stream_allocator.release(stream_id);
            let _ = done_tx.send(if completed {
                StreamResult::Completed
            } else {
                StreamResult::Aborted
            });
        });

        Ok(StreamHandle { stream_id, done: done_rx })
    }

    async fn run_accept_loop(&self, listener: SessionListener) {
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(error) => {
                    tracing::warn!(%error, "failed to accept inbound connection");
                    continue;
                }
            };
            let node = self.clone();
            tokio::spawn(async move { node.handle_inbound(stream, remote_addr).await });
        }
    }

    async fn handle_inbound(&self, mut stream: TcpStream, remote_addr: std::net::SocketAddr) {
        let inner = self.inner.clone();
        let handshake_result = handshake_acceptor(
            &mut stream,
            &self.inner.config.api_key,
            self.inner.config.handshake_timeout,
            |candidate| inner.sessions.contains_key(&candidate),
        )
        .await;

        let (peer_id, token) = match handshake_result {
            Ok(pair) => pair,
            Err(error) => {
                tracing::debug!(%error, %remote_addr, "inbound handshake failed");
                return;
            }
        };

        tracing::info!(peer_id = %peer_id, %remote_addr, "session established (acceptor)");
        self.spawn_session(stream, peer_id, false, token).await;
    }

    /// Spawn one persistent [`Self::discovered_peer_loop`] the first time each
    /// peer is seen. Re-seeing an already-tracked peer only refreshes its
    /// table entry (`PeerSeen` fires once per peer, not once per broadcast),
    /// so a single long-lived loop per peer — rather than one connect
    /// attempt per event — is what actually keeps driving reconnection for
    /// as long as the peer is known.
    async fn run_discovery_bridge(&self, discovery: Arc<DiscoveryManager>) {
        let mut events = discovery.subscribe();
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            };
            let node = self.clone();
            let discovery = discovery.clone();
            let handle = tokio::spawn(async move { node.discovered_peer_loop(discovery, event.node_id).await });
            self.inner.background_tasks.lock().await.push(handle);
        }
    }

    /// Drive connection and reconnection for one discovered peer: retries
    /// the initial connect, and re-connects after an established session
    /// drops, using the same jittered exponential backoff as
    /// [`Self::static_peer_loop`]. Unlike a static peer, a discovered peer
    /// gets only three consecutive failures before its table entry is
    /// evicted; the loop then exits and waits for a fresh `PeerSeen` (i.e.
    /// re-discovery) to spawn a new one.
    async fn discovered_peer_loop(&self, discovery: Arc<DiscoveryManager>, node_id: uuid::Uuid) {
        let peer_id = NodeId::from(node_id);
        let mut backoff = Duration::from_secs(1);
        const MAX_BACKOFF: Duration = Duration::from_secs(60);

        loop {
            if self.inner.sessions.contains_key(&peer_id) {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            let Some(record) = discovery.peer_table().get(&node_id) else {
                tracing::debug!(peer_id = %peer_id, "discovered peer no longer tracked, stopping reconnect loop");
                return;
            };

            match self.connect_to_addr(record.endpoint).await {
                Ok((stream, token)) => {
                    backoff = Duration::from_secs(1);
                    discovery.peer_table().record_success(&node_id);
                    self.spawn_session(stream, peer_id, true, token).await;
                }
                Err(error) => {
                    tracing::debug!(%error, peer_id = %peer_id, "connect to discovered peer failed");
                    if discovery.peer_table().record_failure(&node_id) {
                        tracing::info!(peer_id = %peer_id, "discovered peer evicted after repeated connect failures");
                        return;
                    }
                    let jitter = rand::random::<f64>() * backoff.as_secs_f64();
                    tokio::time::sleep(Duration::from_secs_f64(jitter)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    async fn static_peer_loop(&self, addr: std::net::SocketAddr) {
        let synthetic_id = NodeId::from_address(addr);
        let mut backoff = Duration::from_secs(1);
        const MAX_BACKOFF: Duration = Duration::from_secs(60);

        loop {
            if self.inner.sessions.contains_key(&synthetic_id) {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            match self.connect_to_addr(addr).await {
                Ok((stream, token)) => {
                    backoff = Duration::from_secs(1);
                    self.spawn_session(stream, synthetic_id, true, token).await;
                }
                Err(error) => {
                    tracing::debug!(%error, %addr, "static peer connect failed, retrying");
                    let jitter = rand::random::<f64>() * backoff.as_secs_f64();
                    tokio::time::sleep(Duration::from_secs_f64(jitter)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    /// Connect and complete the initiator's side of the handshake.
    ///
    /// Returns just the transport: the ACCEPT payload carries no identity
    /// field, so this can't tell the caller who it actually reached. The
    /// caller already knows — a real id from the discovery datagram, or a
    /// synthetic one derived from the address for pure static peers.
    async fn connect_to_addr(&self, addr: std::net::SocketAddr) -> Result<(TcpStream, [u8; 8]), ConnectionError> {
        let mut stream = asoc_transport::connect(addr, self.inner.config.connect_timeout).await?;
        let token = handshake_initiator(
            &mut stream,
            self.inner.node_id,
            &self.inner.config.api_key,
            self.inner.config.handshake_timeout,
        )
        .await?;
        Ok((stream, token))
    }

    async fn spawn_session(&self, stream: TcpStream, peer_id: NodeId, is_initiator: bool, session_token: [u8; 8]) {
        if self.inner.sessions.contains_key(&peer_id) {
            return;
        }

        let (send_tx, send_rx) = send_queue();
        let shutdown = Arc::new(Notify::new());
        let session = Arc::new(ActiveSession {
            peer_id,
            is_initiator,
            session_token,
            send_tx,
            stream_allocator: crate::streaming::StreamIdAllocator::new(is_initiator),
            shutdown: shutdown.clone(),
        });
        self.inner.sessions.insert(peer_id, session);

        if let Some(callback) = self.inner.peer_up_callback.read().unwrap().clone() {
            callback(peer_id);
        }

        let callback = self.inner.stream_callback.read().unwrap().clone();
        let reassembler = Arc::new(Reassembler::new(peer_id, is_initiator, callback));
        let ctx = SessionContext {
            max_frame_bytes: self.inner.config.max_frame_bytes,
            idle_timeout: self.inner.config.idle_timeout,
            send_drain_timeout: self.inner.config.send_drain_timeout,
        };

        let node = self.clone();
        tokio::spawn(async move {
            let reason = run_session(stream, ctx, send_rx, reassembler, shutdown).await;
            node.inner.sessions.remove(&peer_id);
            if let Some(callback) = node.inner.peer_down_callback.read().unwrap().clone() {
                callback(peer_id, reason);
            }
        });
    }
}
