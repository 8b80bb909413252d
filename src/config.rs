//! Connection parameters: one validated configuration per protocol.

use filehop_core::{XferError, XferResult};
use filehop_ftp::{FtpConnectionConfig, FtpSecurityMode};
use filehop_sftp::SftpConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for one session, tagged by protocol.
///
/// ```json
/// { "protocol": "ftp", "host": "ftp.example.com", "username": "bob",
///   "password": "secret", "security": "explicit", "keepAlive": true }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum ConnectionParameters {
    #[serde(alias = "ftps")]
    Ftp(FtpConnectionConfig),
    Sftp(SftpConnectionConfig),
}

/// Wire protocol actually spoken by a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ftp,
    Ftps,
    Sftp,
}

impl ConnectionParameters {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> XferResult<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| XferError::invalid_config(format!("bad parameters: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: &Path) -> XferResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            XferError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> XferResult<()> {
        match self {
            Self::Ftp(cfg) => cfg.validate(),
            Self::Sftp(cfg) => cfg.validate(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Ftp(cfg) if cfg.security == FtpSecurityMode::None => Protocol::Ftp,
            Self::Ftp(_) => Protocol::Ftps,
            Self::Sftp(_) => Protocol::Sftp,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Self::Ftp(cfg) => &cfg.host,
            Self::Sftp(cfg) => &cfg.host,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Self::Ftp(cfg) => cfg.port,
            Self::Sftp(cfg) => cfg.port,
        }
    }

    pub fn keep_alive(&self) -> bool {
        match self {
            Self::Ftp(cfg) => cfg.keep_alive,
            Self::Sftp(cfg) => cfg.keep_alive,
        }
    }
}

impl From<FtpConnectionConfig> for ConnectionParameters {
    fn from(cfg: FtpConnectionConfig) -> Self {
        Self::Ftp(cfg)
    }
}

impl From<SftpConnectionConfig> for ConnectionParameters {
    fn from(cfg: SftpConnectionConfig) -> Self {
        Self::Sftp(cfg)
    }
}
