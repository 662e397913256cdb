//! Reachability probe run before vSphere installs.
//!
//! The lab vCenter is only reachable over VPN, and the installer fails late
//! and obscurely without it. A TCP connect to port 443 is enough to tell.

use crate::error::{InstallError, Result};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// How long the vCenter probe waits per resolved address
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to `host:port`, trying each resolved address until one answers.
///
/// # Failure Mode
///
/// Returns a configuration error if DNS resolution fails or no address
/// accepts a connection within `timeout`.
pub fn check_reachable(host: &str, port: u16, timeout: Duration) -> Result<()> {
    let addrs: Vec<_> = (host, port)
        .to_socket_addrs()
        .map_err(|e| unreachable_error(host, &e.to_string()))?
        .collect();

    let mut last_error = format!("no addresses resolved for {}", host);
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_stream) => {
                tracing::info!("{}:{} is reachable ({})", host, port, addr);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{}:{} not reachable via {}: {}", host, port, addr, e);
                last_error = e.to_string();
            }
        }
    }
    Err(unreachable_error(host, &last_error))
}

/// Probe the vCenter's HTTPS port.
pub fn check_vcenter_reachable(vcenter: &str) -> Result<()> {
    let host = vcenter
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    check_reachable(host, 443, PROBE_TIMEOUT)
}

fn unreachable_error(host: &str, reason: &str) -> InstallError {
    InstallError::config(format!(
        "VCenter {} is not reachable ({}). Please check your VPN connection and try again.",
        host, reason
    ))
}
