//! # filehop-ftp: FTP/FTPS engine
//!
//! Implements the client side of RFC 959 with RFC 4217 TLS:
//! - **Explicit FTPS**: AUTH TLS on the plain control channel
//! - **Implicit FTPS**: TLS straight after the greeting
//! - **PASV / PORT** data channels, TLS-wrapped under PROT P
//!
//! Architecture:
//! - `types`: connection configuration
//! - `protocol`: low-level command/response codec
//! - `connection`: TCP dial, timeouts, keepalive
//! - `tls`: rustls client config and stream upgrade
//! - `address`: PASV/PORT host-port encoding
//! - `client`: control channel, login, option negotiation, quit
//! - `transfer`: data channel negotiation (PASV/PORT)
//! - `directory`: listing, mkdir, rmdir, delete, rename
//! - `file_ops`: upload and download

pub mod address;
pub mod client;
pub mod connection;
pub mod directory;
pub mod file_ops;
pub mod protocol;
pub mod tls;
pub mod transfer;
pub mod types;

pub use client::FtpClient;
pub use protocol::{AsyncStream, BoxedStream};
pub use transfer::PendingData;
pub use types::*;
