//! Socket creation, binding and connecting.
//!
//! Everything here is IPv4 stream sockets. Each failing call maps to
//! [`Error::Socket`] tagged with the name of the call.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Turn host text and a port into an IPv4 socket address.
///
/// Dotted-quad literals are taken as is; anything else is resolved and the
/// first IPv4 result wins.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddrV4> {
    if host.is_empty() {
        return Err(Error::Address("empty host".into()));
    }

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(SocketAddrV4::new(ip, port));
    }

    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::Address(format!("{}: {}", host, e)))?;

    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| Error::Address(format!("{}: no IPv4 address", host)))
}

/// Create a fresh IPv4 TCP socket.
pub fn create() -> Result<Socket> {
    Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(Error::socket("socket"))
}

/// A bound, listening endpoint that hands out one peer at a time.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Create, set address reuse, bind and listen.
    pub fn bind(addr: SocketAddrV4, backlog: i32) -> Result<Self> {
        let socket = create()?;
        socket
            .set_reuse_address(true)
            .map_err(Error::socket("setsockopt"))?;
        socket
            .bind(&SockAddr::from(addr))
            .map_err(Error::socket("bind"))?;
        socket.listen(backlog).map_err(Error::socket("listen"))?;

        let inner: TcpListener = socket.into();
        let local_addr = inner.local_addr().map_err(Error::socket("getsockname"))?;
        info!("Listening on {}", local_addr);

        Ok(Self { inner, local_addr })
    }

    /// Address actually bound, with the kernel's choice of port if 0 was asked.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until a peer connects.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.inner.accept().map_err(Error::socket("accept"))?;
        debug!("Accepted connection from {}", peer);
        Ok((stream, peer))
    }
}

/// Connect to `addr`, blocking until the handshake completes or fails.
pub fn connect(addr: SocketAddrV4, timeout: Option<Duration>) -> Result<TcpStream> {
    let socket = create()?;
    let target = SockAddr::from(addr);

    match timeout {
        Some(limit) => socket.connect_timeout(&target, limit),
        None => socket.connect(&target),
    }
    .map_err(Error::socket("connect"))?;

    let stream: TcpStream = socket.into();
    debug!("Connected to {}", addr);
    Ok(stream)
}

/// Apply the read/write timeout to a connected stream.
pub fn apply_timeout(stream: &TcpStream, timeout: Option<Duration>) -> Result<()> {
    stream
        .set_read_timeout(timeout)
        .map_err(Error::socket("setsockopt"))?;
    stream
        .set_write_timeout(timeout)
        .map_err(Error::socket("setsockopt"))?;
    Ok(())
}
