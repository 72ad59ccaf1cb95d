//! Broadcast-capable UDP socket used by the discovery component.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{TransportError, TransportResult};

/// A UDP socket bound for broadcast send and receive on the discovery port.
///
/// Mirrors the bind sequence of an async UDP transport: build with
/// `socket2` for `SO_BROADCAST`/`SO_REUSEADDR`, then hand the resulting
/// non-blocking socket to Tokio.
pub struct DiscoverySocket {
    socket: UdpSocket,
    broadcast_addr: SocketAddr,
}

impl DiscoverySocket {
    /// Bind to `0.0.0.0:port`, configured for broadcast send/receive, and
    /// compute the IPv4 limited-broadcast address used for sends.
    pub fn bind(port: u16) -> TransportResult<Self> {
        let bind_addr: SocketAddr = (IpAddr::V4(Ipv4Addr::UNSPECIFIED), port).into();

        let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(|source| {
            TransportError::Bind {
                addr: bind_addr.to_string(),
                source,
            }
        })?;

        raw.set_reuse_address(true).map_err(|source| TransportError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;
        raw.set_broadcast(true).map_err(|source| TransportError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;
        raw.bind(&bind_addr.into()).map_err(|source| TransportError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;
        raw.set_nonblocking(true).map_err(|source| TransportError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;

        let std_socket: std::net::UdpSocket = raw.into();
        let socket = UdpSocket::from_std(std_socket).map_err(|source| TransportError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;

        let broadcast_addr: SocketAddr = (IpAddr::V4(Ipv4Addr::BROADCAST), port).into();

        Ok(Self {
            socket,
            broadcast_addr,
        })
    }

    /// Broadcast a discovery datagram to the local network segment.
    pub async fn send_broadcast(&self, payload: &[u8]) -> TransportResult<()> {
        self.socket.send_to(payload, self.broadcast_addr).await?;
        Ok(())
    }

    /// Receive a single datagram, returning its length and sender address.
    pub async fn recv_from(&self, buf: &mut [u8]) -> TransportResult<(usize, SocketAddr)> {
        let (len, addr) = self.socket.recv_from(buf).await?;
        Ok((len, addr))
    }

    /// Local address this socket is bound to.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}
