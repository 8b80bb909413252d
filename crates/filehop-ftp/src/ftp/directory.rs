//! Directory operations: listing, mkdir, rmdir, delete, rename.

use crate::ftp::client::FtpClient;
use crate::ftp::file_ops::pump;
use crate::ftp::transfer::PendingData;
use filehop_core::{parse_listing, ControlResponse, Entity, XferResult};

impl FtpClient {
    /// `LIST -aL <path>` and parse the Unix-style reply.
    pub async fn list(&mut self, path: &str) -> XferResult<Vec<Entity>> {
        let raw = self.list_raw(path).await?;
        parse_listing(&raw)
    }

    /// Raw listing text, lossily decoded as UTF-8.
    pub async fn list_raw(&mut self, path: &str) -> XferResult<String> {
        let cmd = if path.is_empty() {
            "LIST -aL".to_string()
        } else {
            format!("LIST -aL {}", path)
        };

        let pending = self.prepare_data_channel().await?;
        self.command(&cmd, 150).await?;
        let body = match self.read_listing(pending).await {
            Ok(body) => body,
            Err(e) => {
                self.abandon();
                return Err(e);
            }
        };
        self.read_reply("", 226).await?;
        log::debug!("LIST {} returned {} bytes", path, body.len());
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn read_listing(&mut self, pending: PendingData) -> XferResult<Vec<u8>> {
        let mut data = self.open_data_stream(pending).await?;
        let mut body = Vec::new();
        pump(&mut data, &mut body).await?;
        Ok(body)
    }

    /// `MKD <path>`.
    pub async fn mkdir(&mut self, path: &str) -> XferResult<ControlResponse> {
        self.command(&format!("MKD {}", path), 257).await
    }

    /// `RMD <path>`.
    pub async fn rmdir(&mut self, path: &str) -> XferResult<ControlResponse> {
        self.command(&format!("RMD {}", path), 250).await
    }

    /// `DELE <path>`.
    pub async fn delete(&mut self, path: &str) -> XferResult<ControlResponse> {
        self.command(&format!("DELE {}", path), 250).await
    }

    /// `RNFR` then `RNTO`.
    pub async fn rename(&mut self, from: &str, to: &str) -> XferResult<ControlResponse> {
        self.command(&format!("RNFR {}", from), 350).await?;
        self.command(&format!("RNTO {}", to), 250).await
    }
}
