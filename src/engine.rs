//! The protocol engine behind a session: FTP/FTPS or SFTP.

use crate::commands::{Operation, OperationOutput};
use crate::config::ConnectionParameters;
use filehop_core::{ControlResponse, XferResult};
use filehop_ftp::FtpClient;
use filehop_sftp::SftpClient;

/// Chosen once from the parameters and never switched afterwards.
pub enum Engine {
    Ftp(FtpClient),
    Sftp(SftpClient),
}

impl Engine {
    pub fn new(params: ConnectionParameters) -> Self {
        match params {
            ConnectionParameters::Ftp(cfg) => Self::Ftp(FtpClient::new(cfg)),
            ConnectionParameters::Sftp(cfg) => Self::Sftp(SftpClient::new(cfg)),
        }
    }

    pub fn is_connected(&self) -> bool {
        match self {
            Self::Ftp(c) => c.is_connected(),
            Self::Sftp(c) => c.is_connected(),
        }
    }

    /// Connect and log in. FTP also negotiates session options.
    pub async fn open(&mut self) -> XferResult<()> {
        match self {
            Self::Ftp(c) => c.establish().await,
            Self::Sftp(c) => c.connect().await,
        }
    }

    /// Say goodbye and release every transport. No-op when not connected.
    pub async fn close(&mut self) -> XferResult<()> {
        match self {
            Self::Ftp(c) if c.is_connected() => c.quit().await.map(|_| ()),
            Self::Ftp(_) => Ok(()),
            Self::Sftp(c) => c.quit().await,
        }
    }

    /// Run one operation on an open connection.
    pub async fn apply(&mut self, op: &Operation) -> XferResult<OperationOutput> {
        use OperationOutput::{Bytes, Entities};

        match (self, op) {
            (_, Operation::ConnectTest) => Ok(OperationOutput::None),

            (Self::Ftp(c), Operation::List { path }) => c.list(path).await.map(Entities),
            (Self::Ftp(c), Operation::Download { remote, local }) => {
                c.download(remote, local).await.map(Bytes)
            }
            (Self::Ftp(c), Operation::Upload { local, remote }) => {
                c.upload(local, remote).await.map(Bytes)
            }
            (Self::Ftp(c), Operation::Delete { path }) => c.delete(path).await.map(|_| OperationOutput::None),
            (Self::Ftp(c), Operation::Mkdir { path }) => c.mkdir(path).await.map(|_| OperationOutput::None),
            (Self::Ftp(c), Operation::Rmdir { path }) => c.rmdir(path).await.map(|_| OperationOutput::None),
            (Self::Ftp(c), Operation::Rename { from, to }) => {
                c.rename(from, to).await.map(|_| OperationOutput::None)
            }

            (Self::Sftp(c), Operation::List { path }) => c.list(path).await.map(Entities),
            (Self::Sftp(c), Operation::Download { remote, local }) => {
                c.download(remote, local).await.map(Bytes)
            }
            (Self::Sftp(c), Operation::Upload { local, remote }) => {
                c.upload(local, remote).await.map(Bytes)
            }
            (Self::Sftp(c), Operation::Delete { path }) => c.delete(path).await.map(|_| OperationOutput::None),
            (Self::Sftp(c), Operation::Mkdir { path }) => c.mkdir(path).await.map(|_| OperationOutput::None),
            (Self::Sftp(c), Operation::Rmdir { path }) => c.rmdir(path).await.map(|_| OperationOutput::None),
            (Self::Sftp(c), Operation::Rename { from, to }) => {
                c.rename(from, to).await.map(|_| OperationOutput::None)
            }
        }
    }

    /// Control responses recorded since the last call. SFTP has none.
    pub fn take_transcript(&mut self) -> Vec<ControlResponse> {
        match self {
            Self::Ftp(c) => c.take_transcript(),
            Self::Sftp(_) => Vec::new(),
        }
    }
}
