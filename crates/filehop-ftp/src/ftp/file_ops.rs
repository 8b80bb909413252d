//! File upload (STOR) and download (RETR).

use crate::ftp::client::FtpClient;
use crate::ftp::protocol::BoxedStream;
use crate::ftp::transfer::PendingData;
use filehop_core::{TransferDirection, XferError, XferResult};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Local side of a transfer.
enum LocalFile<'a> {
    /// Already opened for reading (STOR).
    Source(File),
    /// Created only once the server has accepted RETR.
    Target(&'a Path),
}

impl FtpClient {
    /// Upload `local` to `remote`. Returns the number of bytes sent.
    pub async fn upload(&mut self, local: &Path, remote: &str) -> XferResult<u64> {
        let file = File::open(local)
            .await
            .map_err(|e| XferError::transfer(format!("open {}: {}", local.display(), e)))?;
        let n = self
            .run_transfer(&format!("STOR {}", remote), LocalFile::Source(file))
            .await?;
        log::info!("uploaded {} -> {} ({} bytes)", local.display(), remote, n);
        Ok(n)
    }

    /// Download `remote` into `local`. Returns bytes received.
    ///
    /// `local` is left untouched unless the server answers RETR with 150
    /// and the data connection comes up.
    pub async fn download(&mut self, remote: &str, local: &Path) -> XferResult<u64> {
        let n = self
            .run_transfer(&format!("RETR {}", remote), LocalFile::Target(local))
            .await?;
        log::info!("downloaded {} -> {} ({} bytes)", remote, local.display(), n);
        Ok(n)
    }

    async fn run_transfer(&mut self, command: &str, local: LocalFile<'_>) -> XferResult<u64> {
        let pending = self.prepare_data_channel().await?;
        self.command(command, 150).await?;

        // Past the 150 the control channel is mid-transfer; a failure here
        // leaves it out of step, so the connection is dropped.
        match self.copy_data(pending, local).await {
            Ok(n) => {
                self.read_reply("", 226).await?;
                Ok(n)
            }
            Err(e) => {
                self.abandon();
                Err(e)
            }
        }
    }

    async fn copy_data(&mut self, pending: PendingData, local: LocalFile<'_>) -> XferResult<u64> {
        let data = self.open_data_stream(pending).await?;
        match local {
            LocalFile::Source(mut file) => transfer(TransferDirection::Upload, data, &mut file).await,
            LocalFile::Target(path) => {
                let mut file = File::create(path).await.map_err(|e| {
                    XferError::transfer(format!("create {}: {}", path.display(), e))
                })?;
                transfer(TransferDirection::Download, data, &mut file).await
            }
        }
    }
}

/// Copy between the data stream and a local file, then close the stream.
pub async fn transfer(
    direction: TransferDirection,
    mut data: BoxedStream,
    file: &mut File,
) -> XferResult<u64> {
    let n = match direction {
        TransferDirection::Upload => {
            let n = pump(file, &mut data).await?;
            data.shutdown()
                .await
                .map_err(|e| XferError::transfer(format!("closing data channel: {}", e)))?;
            n
        }
        TransferDirection::Download => {
            let n = pump(&mut data, file).await?;
            file.sync_all().await?;
            if let Err(e) = data.shutdown().await {
                log::debug!("data channel shutdown: {}", e);
            }
            n
        }
    };
    drop(data);
    Ok(n)
}

/// Copy until EOF. A TLS peer that closes without close_notify counts as
/// EOF.
pub(crate) async fn pump<R, W>(reader: &mut R, writer: &mut W) -> XferResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(XferError::transfer(format!("read: {}", e))),
        };
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|e| XferError::transfer(format!("write: {}", e)))?;
        total += n as u64;
    }
    writer
        .flush()
        .await
        .map_err(|e| XferError::transfer(format!("flush: {}", e)))?;
    Ok(total)
}
