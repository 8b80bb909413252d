// ── Directory operations ─────────────────────────────────────────────────────

use crate::sftp::client::{shell_quote, SftpClient};
use filehop_core::{parse_listing, Entity, XferError, XferResult};
use log::info;
use std::path::Path;

impl SftpClient {
    // ── List directory ───────────────────────────────────────────────────────

    /// Run `ls -al` remotely and parse the output with the shared grammar.
    pub async fn list(&mut self, path: &str) -> XferResult<Vec<Entity>> {
        let command = if path.is_empty() {
            "ls -al".to_string()
        } else {
            format!("ls -al {}", shell_quote(path))
        };
        let raw = self.run_shell(&command).await?;
        parse_listing(&String::from_utf8_lossy(&raw))
    }

    // ── Create / remove ──────────────────────────────────────────────────────

    pub async fn mkdir(&mut self, path: &str) -> XferResult<()> {
        self.sftp()?
            .mkdir(Path::new(path), 0o755)
            .map_err(|e| XferError::remote(format!("mkdir '{}' failed: {}", path, e)))?;
        info!("SFTP mkdir {}", path);
        Ok(())
    }

    pub async fn rmdir(&mut self, path: &str) -> XferResult<()> {
        self.sftp()?
            .rmdir(Path::new(path))
            .map_err(|e| XferError::remote(format!("rmdir '{}' failed: {}", path, e)))?;
        info!("SFTP rmdir {}", path);
        Ok(())
    }
}
