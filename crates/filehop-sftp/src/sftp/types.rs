// ── Types ─────────────────────────────────────────────────────────────────────

use filehop_core::{XferError, XferResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ── Serde default helpers ────────────────────────────────────────────────────

fn default_sftp_port() -> u16 {
    22
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_keepalive_secs() -> u64 {
    30
}

// ── Connection & Authentication ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SftpConnectionConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    #[serde(default)]
    pub private_key_passphrase: Option<String>,
    /// Keep one SSH session open across operations.
    #[serde(default)]
    pub keep_alive: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// SSH-level keepalive interval while the session is held open.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_interval_secs: u64,
}

impl SftpConnectionConfig {
    /// Password authentication.
    pub fn with_password(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        keep_alive: bool,
    ) -> XferResult<Self> {
        let cfg = Self {
            host: host.into(),
            port,
            username: username.into(),
            password: Some(password.into()),
            private_key_path: None,
            private_key_passphrase: None,
            keep_alive,
            timeout_secs: default_timeout_secs(),
            keepalive_interval_secs: default_keepalive_secs(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Public-key authentication from a key file, optionally encrypted.
    pub fn with_key(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        key_path: impl Into<PathBuf>,
        passphrase: Option<String>,
        keep_alive: bool,
    ) -> XferResult<Self> {
        let cfg = Self {
            host: host.into(),
            port,
            username: username.into(),
            password: None,
            private_key_path: Some(key_path.into()),
            private_key_passphrase: passphrase,
            keep_alive,
            timeout_secs: default_timeout_secs(),
            keepalive_interval_secs: default_keepalive_secs(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// libssh2 timeout in milliseconds, saturating at `u32::MAX`.
    pub fn timeout_ms(&self) -> u32 {
        u32::try_from(self.timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> XferResult<()> {
        if self.host.trim().is_empty() {
            return Err(XferError::invalid_config("host is empty"));
        }
        if self.port == 0 {
            return Err(XferError::invalid_config("port must be non-zero"));
        }
        if self.username.is_empty() {
            return Err(XferError::invalid_config("username is empty"));
        }
        let has_password = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if !has_password && self.private_key_path.is_none() {
            return Err(XferError::invalid_config(
                "either a password or a private key is required",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(XferError::invalid_config("timeout must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_config() {
        let cfg = SftpConnectionConfig::with_password("h", 22, "u", "pw", false).unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert!(SftpConnectionConfig::with_password("h", 22, "u", "", false).is_err());
        assert!(SftpConnectionConfig::with_password("", 22, "u", "pw", false).is_err());
    }

    #[test]
    fn timeout_ms_saturates() {
        let mut cfg = SftpConnectionConfig::with_password("h", 22, "u", "pw", false).unwrap();
        assert_eq!(cfg.timeout_ms(), 10_000);
        cfg.timeout_secs = 5_000_000;
        assert_eq!(cfg.timeout_ms(), u32::MAX);
        cfg.timeout_secs = u64::MAX;
        assert_eq!(cfg.timeout_ms(), u32::MAX);
    }

    #[test]
    fn key_config() {
        let cfg = SftpConnectionConfig::with_key("h", 22, "u", "/k", Some("pp".into()), true)
            .unwrap();
        assert_eq!(cfg.private_key_path.as_deref(), Some(std::path::Path::new("/k")));
    }

    #[test]
    fn deserialize_needs_credentials() {
        let cfg: SftpConnectionConfig =
            serde_json::from_str(r#"{"host":"h","username":"u"}"#).unwrap();
        assert_eq!(cfg.port, 22);
        assert!(cfg.validate().is_err());
    }
}
