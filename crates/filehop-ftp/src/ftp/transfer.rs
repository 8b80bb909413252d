//! Data-channel management for FTP transfers.
//!
//! - **PASV**: server opens a port, client connects
//! - **PORT**: client opens a port, tells the server
//!
//! Negotiation happens before the transfer command; the connection itself
//! is completed after the server's 150, which matters for PORT since the
//! server only dials once it has accepted the command. On FTPS the data
//! socket is TLS-wrapped with the control channel's client config.

use crate::ftp::address::{format_port_argument, parse_pasv_reply};
use crate::ftp::client::FtpClient;
use crate::ftp::protocol::BoxedStream;
use crate::ftp::types::DataChannelMode;
use filehop_core::{XferError, XferResult};
use std::net::{IpAddr, Ipv4Addr};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

/// A negotiated data channel that is not yet usable.
pub enum PendingData {
    /// PASV: already dialled.
    Connected(TcpStream),
    /// PORT: waiting for the server to dial in.
    Listening(TcpListener),
}

impl FtpClient {
    /// Run PASV or PORT according to the configured mode.
    pub async fn prepare_data_channel(&mut self) -> XferResult<PendingData> {
        match self.config().data_channel {
            DataChannelMode::Passive => self.open_pasv().await,
            DataChannelMode::Active { listen_port } => self.open_port(listen_port).await,
        }
    }

    /// Issue `PASV`, parse the 227 text, connect to the returned address.
    async fn open_pasv(&mut self) -> XferResult<PendingData> {
        let resp = self.command("PASV", 227).await?;
        let addr = parse_pasv_reply(&resp.message)?;
        let tcp = timeout(self.config().data_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| XferError::transfer(format!("PASV data connect to {} timed out", addr)))?
            .map_err(|e| XferError::transfer(format!("PASV data connect to {}: {}", addr, e)))?;
        log::debug!("data channel connected to {}", addr);
        Ok(PendingData::Connected(tcp))
    }

    /// Bind a local listener first, then announce it with `PORT`.
    async fn open_port(&mut self, listen_port: u16) -> XferResult<PendingData> {
        let ip = match self.config().active_address {
            Some(ip) => ip,
            None => local_ipv4()?,
        };
        let listener = TcpListener::bind((ip, listen_port))
            .await
            .map_err(|e| XferError::transfer(format!("PORT bind {}:{}: {}", ip, listen_port, e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| XferError::transfer(format!("PORT local_addr: {}", e)))?
            .port();

        let arg = format_port_argument(ip, port)?;
        self.command(&format!("PORT {}", arg), 200).await?;
        log::debug!("listening for data connection on {}:{}", ip, port);
        Ok(PendingData::Listening(listener))
    }

    /// Complete the data connection and wrap it in TLS on FTPS.
    pub async fn open_data_stream(&mut self, pending: PendingData) -> XferResult<BoxedStream> {
        let tcp = match pending {
            PendingData::Connected(tcp) => tcp,
            PendingData::Listening(listener) => {
                let (tcp, peer) = timeout(self.config().data_timeout(), listener.accept())
                    .await
                    .map_err(|_| {
                        XferError::transfer("PORT accept timed out waiting for the server")
                    })?
                    .map_err(|e| XferError::transfer(format!("PORT accept: {}", e)))?;
                log::debug!("data connection accepted from {}", peer);
                tcp
            }
        };
        tcp.set_nodelay(true).ok();

        let stream: BoxedStream = Box::new(tcp);
        if self.config().is_secure() {
            self.upgrader()?.upgrade(stream).await
        } else {
            Ok(stream)
        }
    }
}

/// First non-loopback IPv4 address of this host.
pub fn local_ipv4() -> XferResult<Ipv4Addr> {
    let interfaces = get_if_addrs::get_if_addrs()
        .map_err(|e| XferError::transfer(format!("cannot enumerate interfaces: {}", e)))?;
    interfaces
        .iter()
        .filter(|iface| !iface.is_loopback())
        .find_map(|iface| match iface.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| XferError::transfer("no non-loopback IPv4 address for active mode"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ipv4_is_never_loopback() {
        // Containers may have no external interface at all.
        if let Ok(ip) = local_ipv4() {
            assert!(!ip.is_loopback());
        }
    }
}
