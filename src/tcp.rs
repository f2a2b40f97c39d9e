use crate::err::{AppliesTo, IoErrorExt};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::{TcpListener, TcpStream};

/// Binds `addr`. The IPv6 wildcard also accepts IPv4 where the host allows it,
/// and falls back to the IPv4 wildcard on hosts without IPv6.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, io::Error> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) if addr.ip().is_unspecified() && addr.is_ipv6() => {
            let v4 = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), addr.port());
            log::warn!("Failed to bind {}, falling back to {}: {}", addr, v4, e);
            TcpListener::bind(v4).await
        }
        Err(e) => Err(e),
    }
}

/// Accepts the next connection, skipping ones that were torn down before we got to them.
pub async fn accept(listener: &mut TcpListener) -> Result<TcpStream, io::Error> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                log::trace!("Accepted connection from {}", addr);
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => match e.applies_to() {
                AppliesTo::Connection => log::debug!("Aborted connection dropped: {}", e),
                AppliesTo::Listener => return Err(e),
            },
        }
    }
}
