use std::net::SocketAddr;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, error};

use crate::error::{NetworkError, Result};

/// How long a single connection attempt may take before the port is
/// considered unavailable
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    /// Nothing accepted a connection
    Free,
    /// Something accepted a connection
    Taken,
}

pub struct PortChecker;

impl PortChecker {
    /// Check that every port is free on `host`.
    ///
    /// Stops at the first port that is taken. A port that cannot be probed
    /// (unresolvable host, timeout) counts as unavailable.
    pub async fn is_port_range_available(ports: &[u16], host: &str) -> bool {
        for &port in ports {
            match Self::probe(host, port).await {
                Ok(PortStatus::Free) => {
                    debug!("Port {} is available on your host", port);
                }
                Ok(PortStatus::Taken) => {
                    error!("Port {} is unavailable on your host", port);
                    return false;
                }
                Err(e) => {
                    error!("Port {} is unavailable on your host ({})", port, e);
                    return false;
                }
            }
        }
        true
    }

    /// Try to connect to `port` on every address `host` resolves to.
    /// The probe connection is closed as soon as it is established.
    pub async fn probe(host: &str, port: u16) -> Result<PortStatus> {
        let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
        if addrs.is_empty() {
            return Err(NetworkError::UnresolvedHost(host.to_owned()));
        }

        for addr in addrs {
            match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
                Ok(Ok(_stream)) => return Ok(PortStatus::Taken),
                Ok(Err(e)) => debug!("Connecting to {} failed: {}", addr, e),
                Err(_) => {
                    return Err(NetworkError::Timeout {
                        host: host.to_owned(),
                        port,
                    })
                }
            }
        }
        Ok(PortStatus::Free)
    }
}
