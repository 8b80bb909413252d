// ── File operations ──────────────────────────────────────────────────────────

use crate::sftp::client::SftpClient;
use filehop_core::{XferError, XferResult};
use log::info;
use std::fs::File;
use std::path::Path;

impl SftpClient {
    // ── Upload / download ────────────────────────────────────────────────────

    /// Copy `local` to `remote`, replacing it. Returns bytes written.
    pub async fn upload(&mut self, local: &Path, remote: &str) -> XferResult<u64> {
        let mut src = File::open(local)
            .map_err(|e| XferError::transfer(format!("open {}: {}", local.display(), e)))?;
        let mut dst = self
            .sftp()?
            .create(Path::new(remote))
            .map_err(|e| XferError::remote(format!("create '{}' failed: {}", remote, e)))?;
        let n = std::io::copy(&mut src, &mut dst)
            .map_err(|e| XferError::transfer(format!("upload to '{}': {}", remote, e)))?;
        info!("SFTP uploaded {} -> {} ({} bytes)", local.display(), remote, n);
        Ok(n)
    }

    /// Copy `remote` into `local`, truncating it. Returns bytes read.
    pub async fn download(&mut self, remote: &str, local: &Path) -> XferResult<u64> {
        let mut src = self
            .sftp()?
            .open(Path::new(remote))
            .map_err(|e| XferError::remote(format!("open '{}' failed: {}", remote, e)))?;
        let mut dst = File::create(local)
            .map_err(|e| XferError::transfer(format!("create {}: {}", local.display(), e)))?;
        let n = std::io::copy(&mut src, &mut dst)
            .map_err(|e| XferError::transfer(format!("download of '{}': {}", remote, e)))?;
        dst.sync_all()?;
        info!("SFTP downloaded {} -> {} ({} bytes)", remote, local.display(), n);
        Ok(n)
    }

    // ── Rename / delete ──────────────────────────────────────────────────────

    pub async fn rename(&mut self, from: &str, to: &str) -> XferResult<()> {
        self.sftp()?
            .rename(Path::new(from), Path::new(to), None)
            .map_err(|e| XferError::remote(format!("rename '{}' → '{}' failed: {}", from, to, e)))?;
        info!("SFTP renamed {} -> {}", from, to);
        Ok(())
    }

    pub async fn delete(&mut self, path: &str) -> XferResult<()> {
        self.sftp()?
            .unlink(Path::new(path))
            .map_err(|e| XferError::remote(format!("delete '{}' failed: {}", path, e)))?;
        info!("SFTP deleted {}", path);
        Ok(())
    }
}
