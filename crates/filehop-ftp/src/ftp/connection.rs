//! TCP transport: dials the control connection and applies the timeout
//! and keepalive policy from `FtpConnectionConfig`.

use crate::ftp::types::FtpConnectionConfig;
use filehop_core::{XferError, XferResult};
use socket2::{SockRef, TcpKeepalive};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Dial `host:port` within the configured connect timeout.
pub async fn dial(config: &FtpConnectionConfig) -> XferResult<TcpStream> {
    let addr = format!("{}:{}", config.host, config.port);
    let tcp = timeout(config.connect_timeout(), TcpStream::connect(&addr))
        .await
        .map_err(|_| XferError::connection(format!("TCP connect to {} timed out", addr)))?
        .map_err(|e| XferError::connection(format!("TCP connect to {}: {}", addr, e)))?;

    tcp.set_nodelay(true).ok();
    if let Some(interval) = config.tcp_keepalive() {
        set_keepalive(&tcp, interval);
    }
    log::debug!("connected to {}", addr);
    Ok(tcp)
}

/// Enable TCP keepalive probes. Failure is logged, not fatal.
pub fn set_keepalive(tcp: &TcpStream, interval: Duration) {
    let ka = TcpKeepalive::new().with_time(interval);
    if let Err(e) = SockRef::from(tcp).set_tcp_keepalive(&ka) {
        log::debug!("TCP keepalive not applied: {}", e);
    }
}
