//! # ASoc Core
//!
//! The node orchestration layer: wires the codec, discovery and transport
//! crates into the public [`Node`] API described by the protocol's
//! external interfaces — membership, authenticated sessions, and
//! chunked, multiplexed, backpressured streaming of opaque payloads.
//!
//! - [`config`]: recognized [`NodeConfig`] options and their validation.
//! - [`identity`]: the [`NodeId`] type.
//! - [`connection`]: handshake and established-session I/O loops.
//! - [`streaming`]: stream id allocation, chunking and reassembly.
//! - [`error`]: the error hierarchy surfaced at each layer.
//!
//! # Example
//!
//! ```no_run
//! use asoc_core::{Node, NodeConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let node = Node::new(NodeConfig::new("my-cluster", b"0123456789abcdef".to_vec()))?;
//! node.on_stream(|peer_id, mut reader| {
//!     tokio::spawn(async move {
//!         let payload = reader.read_to_end().await;
//!         tracing::info!(%peer_id, bytes = payload.len(), "received stream");
//!     });
//! });
//! node.start().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod connection;
pub mod error;
mod identity;
mod node;
mod streaming;

pub use config::NodeConfig;
pub use error::{ConfigError, ConnectionError, NodeError, NodeResult, PeerDownReason, ProtocolViolation, StreamError};
pub use identity::NodeId;
pub use node::Node;
pub use streaming::{StreamHandle, StreamOpts, StreamReader, StreamResult};
