//! TCP transport used to carry established sessions.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::error::{TransportError, TransportResult};

/// Listens for incoming session connections on the data port.
pub struct SessionListener {
    inner: TcpListener,
}

impl SessionListener {
    /// Bind a TCP listener to `addr`.
    pub async fn bind(addr: SocketAddr) -> TransportResult<Self> {
        let inner = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self { inner })
    }

    /// Accept the next inbound connection.
    pub async fn accept(&self) -> TransportResult<(TcpStream, SocketAddr)> {
        let (stream, peer_addr) = self.inner.accept().await?;
        stream.set_nodelay(true).ok();
        Ok((stream, peer_addr))
    }

    /// Local address this listener is bound to.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }
}

/// Open an outbound TCP connection to `addr`, bounded by `timeout`.
pub async fn connect(addr: SocketAddr, timeout: Duration) -> TransportResult<TcpStream> {
    let attempt = TcpStream::connect(addr);
    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(stream)) => {
            stream.set_nodelay(true).ok();
            Ok(stream)
        }
        Ok(Err(source)) => Err(TransportError::Connect {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(TransportError::ConnectTimeout {
            addr: addr.to_string(),
        }),
    }
}
