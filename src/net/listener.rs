//! TCP listener setup.
//!
//! # Responsibilities
//! - Pick a sensible default address (first non-loopback IPv4)
//! - Bind to the configured address before the server starts accepting
//! - Describe the public URL clients should use

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, UdpSocket};

use url::Url;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A bound, not yet accepting, TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the configured address.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let ip: IpAddr = config
            .address
            .parse()
            .map_err(|_| ListenerError::Address(config.address.clone()))?;
        let addr = SocketAddr::new(ip, config.port);

        let bind_err = |source| ListenerError::Bind { addr, source };
        let inner = TcpListener::bind(addr).map_err(bind_err)?;
        inner.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = inner.local_addr().map_err(bind_err)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_std(self) -> TcpListener {
        self.inner
    }
}

/// URL clients use to reach a listener at `addr`.
pub fn public_url(addr: SocketAddr, tls: bool) -> Result<Url, url::ParseError> {
    let scheme = if tls { "https" } else { "http" };
    // SocketAddr's Display brackets IPv6 hosts, which Url expects.
    Url::parse(&format!("{scheme}://{addr}/"))
}

/// First non-loopback IPv4 address of this host, or `0.0.0.0`.
///
/// Connecting a UDP socket sends nothing; it only asks the kernel which
/// local address routes outward.
pub fn default_address() -> IpAddr {
    outbound_ipv4().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn outbound_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}
