//! Cross-platform TCP socket configuration for the client connection.
//!
//! [`SocketConfig`] gathers the options applied to every outgoing connection
//! (connect timeout, TCP_NODELAY, keepalive) and [`connect_stream`] applies
//! them consistently across Linux, Windows, and macOS.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};

/// Socket options for the client connection.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Upper bound on a single blocking connect. Default: 5s.
    pub connect_timeout: Duration,
    /// Disable Nagle's algorithm for lower latency. Default: true.
    pub tcp_nodelay: bool,
    /// Enable TCP keepalive. Default: true.
    pub keepalive_enabled: bool,
    /// Keepalive idle time before the first probe. Default: 60s.
    pub keepalive_idle: Duration,
    /// Keepalive probe interval. Default: 10s.
    pub keepalive_interval: Duration,
    /// Number of keepalive probes before declaring the connection dead. Default: 3.
    pub keepalive_retries: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            tcp_nodelay: true,
            keepalive_enabled: true,
            keepalive_idle: Duration::from_secs(60),
            keepalive_interval: Duration::from_secs(10),
            keepalive_retries: 3,
        }
    }
}

/// Apply socket configuration to a connected stream.
pub fn configure_stream(stream: &TcpStream, config: &SocketConfig) -> io::Result<()> {
    stream.set_nodelay(config.tcp_nodelay)?;

    if config.keepalive_enabled {
        let sock_ref = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(config.keepalive_idle)
            .with_interval(config.keepalive_interval);

        // Retries are supported on Linux and Windows but not macOS.
        #[cfg(any(target_os = "linux", target_os = "windows"))]
        let keepalive = keepalive.with_retries(config.keepalive_retries);

        sock_ref.set_tcp_keepalive(&keepalive)?;
    }

    Ok(())
}

/// Connect to the first reachable address and configure the stream.
///
/// Returns the last connect error when every address fails.
pub fn connect_stream(addrs: &[SocketAddr], config: &SocketConfig) -> io::Result<TcpStream> {
    let mut last_err = io::Error::new(io::ErrorKind::InvalidInput, "no address to connect to");

    for addr in addrs {
        match TcpStream::connect_timeout(addr, config.connect_timeout) {
            Ok(stream) => {
                configure_stream(&stream, config)?;
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connect to {addr} failed: {e}");
                last_err = e;
            }
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_tcp_nodelay_is_set() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = connect_stream(&[addr], &SocketConfig::default()).unwrap();
        assert!(client.nodelay().unwrap(), "TCP_NODELAY should be enabled");
    }

    #[test]
    fn test_nodelay_disabled_when_configured() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = SocketConfig {
            tcp_nodelay: false,
            ..Default::default()
        };

        let client = connect_stream(&[addr], &config).unwrap();
        assert!(!client.nodelay().unwrap());
    }

    #[test]
    fn test_keepalive_is_configured() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = SocketConfig {
            keepalive_idle: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(5),
            ..Default::default()
        };

        let client = connect_stream(&[addr], &config).unwrap();
        assert!(SockRef::from(&client).keepalive().unwrap());
    }

    #[test]
    fn test_falls_through_to_reachable_address() {
        let dead = TcpListener::bind("127.0.0.1:0").unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        let live = TcpListener::bind("127.0.0.1:0").unwrap();
        let live_addr = live.local_addr().unwrap();

        let client = connect_stream(&[dead_addr, live_addr], &SocketConfig::default()).unwrap();
        assert_eq!(client.peer_addr().unwrap(), live_addr);
    }

    #[test]
    fn test_no_address_is_an_error() {
        let result = connect_stream(&[], &SocketConfig::default());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }
}
