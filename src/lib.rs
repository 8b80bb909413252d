//! # filehop
//!
//! A file-transfer client for plain FTP, FTPS (explicit and implicit TLS)
//! and SFTP behind one operation set: connect, list, upload, download,
//! delete, mkdir, rmdir, rename and quit.
//!
//! ```no_run
//! # async fn demo() -> filehop::XferResult<()> {
//! use filehop::{ConnectionParameters, Session};
//!
//! let params = ConnectionParameters::from_json(
//!     r#"{"protocol":"ftp","host":"ftp.example.com","username":"bob",
//!         "password":"secret","security":"explicit","keepAlive":true}"#,
//! )?;
//! let mut session = Session::new(params)?;
//! session.connect().await?;
//! for entry in session.list("/pub").await? {
//!     println!("{} {}", entry.size, entry.name);
//! }
//! session.quit().await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod engine;
pub mod logging;
pub mod session;

pub use commands::{Operation, OperationOutput, OperationReport, ReportState};
pub use config::{ConnectionParameters, Protocol};
pub use engine::Engine;
pub use session::{Session, SessionInfo};

pub use filehop_core::{
    ConnectionState, ControlResponse, Entity, EntityType, Permission, Permissions,
    TransferDirection, XferError, XferErrorKind, XferResult,
};
pub use filehop_ftp::{DataChannelMode, FtpClient, FtpConnectionConfig, FtpSecurityMode, TlsOptions};
pub use filehop_sftp::{SftpClient, SftpConnectionConfig};
