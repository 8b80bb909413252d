//! Connection configuration for the FTP engine.

use filehop_core::{XferError, XferResult};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Well-known port for implicit FTPS.
pub const IMPLICIT_FTPS_PORT: u16 = 990;

// ─── Connection / Session ────────────────────────────────────────────

/// Security mode for the control channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FtpSecurityMode {
    /// Plain-text FTP.
    #[default]
    None,
    /// Explicit FTPS: starts plain then upgrades via AUTH TLS.
    Explicit,
    /// Implicit FTPS: TLS right after the greeting.
    Implicit,
}

/// How the data connection for LIST/STOR/RETR is established.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum DataChannelMode {
    /// Server listens, client dials (PASV).
    #[default]
    Passive,
    /// Client listens, server dials (PORT). Port 0 picks an ephemeral port.
    #[serde(rename_all = "camelCase")]
    Active {
        #[serde(default)]
        listen_port: u16,
    },
}

/// Certificate material for FTPS.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsOptions {
    /// Accept any server certificate.
    #[serde(default)]
    pub trust_all: bool,
    /// PEM bundle trusted instead of the system roots.
    #[serde(default)]
    pub root_ca_path: Option<PathBuf>,
    /// PEM client certificate chain.
    #[serde(default)]
    pub client_cert_path: Option<PathBuf>,
    /// PEM private key matching `client_cert_path`.
    #[serde(default)]
    pub client_key_path: Option<PathBuf>,
}

/// Configuration for a single FTP connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    /// `None` skips PASS; some servers log in on USER alone (230).
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub security: FtpSecurityMode,
    #[serde(default)]
    pub tls: TlsOptions,
    #[serde(default)]
    pub data_channel: DataChannelMode,
    /// IPv4 address advertised in PORT. Defaults to the first
    /// non-loopback interface address.
    #[serde(default)]
    pub active_address: Option<Ipv4Addr>,
    /// Keep one control connection open across operations.
    #[serde(default)]
    pub keep_alive: bool,
    /// Dial and TLS handshake timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Data-channel dial/accept timeout in seconds.
    #[serde(default = "default_data_timeout")]
    pub data_timeout_sec: u64,
    /// TCP keepalive probe interval in seconds (0 = off).
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_sec: u64,
}

fn default_port() -> u16 {
    21
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_data_timeout() -> u64 {
    30
}
fn default_tcp_keepalive() -> u64 {
    30
}

impl Default for FtpConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: "anonymous".into(),
            password: Some("anonymous@".into()),
            security: FtpSecurityMode::None,
            tls: TlsOptions::default(),
            data_channel: DataChannelMode::Passive,
            active_address: None,
            keep_alive: false,
            connect_timeout_sec: default_connect_timeout(),
            data_timeout_sec: default_data_timeout(),
            tcp_keepalive_sec: default_tcp_keepalive(),
        }
    }
}

impl FtpConnectionConfig {
    /// Plain FTP in passive mode.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: Option<String>,
        keep_alive: bool,
    ) -> XferResult<Self> {
        let cfg = Self {
            host: host.into(),
            port,
            username: username.into(),
            password,
            keep_alive,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Switch to active mode, listening on `listen_port` (0 = ephemeral).
    pub fn active_mode(mut self, listen_port: u16) -> Self {
        self.data_channel = DataChannelMode::Active { listen_port };
        self
    }

    /// Advertise a fixed address in PORT.
    pub fn active_address(mut self, addr: Ipv4Addr) -> Self {
        self.active_address = Some(addr);
        self
    }

    /// Require explicit FTPS unless implicit was already chosen.
    pub fn secure(mut self, trust_all: bool) -> Self {
        if self.security == FtpSecurityMode::None {
            self.security = FtpSecurityMode::Explicit;
        }
        self.tls.trust_all = trust_all;
        self
    }

    /// Supply a root CA and an optional client certificate; implies FTPS.
    pub fn certs(
        mut self,
        root_ca: Option<PathBuf>,
        client_cert: Option<PathBuf>,
        client_key: Option<PathBuf>,
    ) -> Self {
        if self.security == FtpSecurityMode::None {
            self.security = FtpSecurityMode::Explicit;
        }
        self.tls.root_ca_path = root_ca;
        self.tls.client_cert_path = client_cert;
        self.tls.client_key_path = client_key;
        self
    }

    /// Implicit FTPS. A port of 0 selects 990.
    pub fn implicit(mut self, port: u16) -> Self {
        self.security = FtpSecurityMode::Implicit;
        self.port = if port == 0 { IMPLICIT_FTPS_PORT } else { port };
        self
    }

    pub fn is_secure(&self) -> bool {
        self.security != FtpSecurityMode::None
    }

    pub fn is_active(&self) -> bool {
        matches!(self.data_channel, DataChannelMode::Active { .. })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_sec)
    }

    pub fn tcp_keepalive(&self) -> Option<Duration> {
        (self.tcp_keepalive_sec > 0).then(|| Duration::from_secs(self.tcp_keepalive_sec))
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
        if self.password.as_deref() == Some("") {
            return Err(XferError::invalid_config("password is empty"));
        }
        if self.connect_timeout_sec == 0 || self.data_timeout_sec == 0 {
            return Err(XferError::invalid_config("timeouts must be non-zero"));
        }
        if self.tls.client_cert_path.is_some() != self.tls.client_key_path.is_some() {
            return Err(XferError::invalid_config(
                "client certificate and key must be given together",
            ));
        }
        if !self.is_active() && self.active_address.is_some() {
            return Err(XferError::invalid_config(
                "active address given but the data channel is passive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filehop_core::XferErrorKind;

    #[test]
    fn builder_chain() {
        let cfg = FtpConnectionConfig::new("ftp.example.com", 21, "bob", Some("pw".into()), true)
            .unwrap()
            .active_mode(0)
            .secure(true);
        assert_eq!(cfg.security, FtpSecurityMode::Explicit);
        assert!(cfg.tls.trust_all);
        assert!(cfg.is_active());
        assert!(cfg.keep_alive);
    }

    #[test]
    fn implicit_defaults_to_990() {
        let cfg = FtpConnectionConfig::new("h", 21, "u", None, false)
            .unwrap()
            .implicit(0);
        assert_eq!(cfg.port, 990);
        assert_eq!(cfg.security, FtpSecurityMode::Implicit);
        // secure() keeps implicit.
        assert_eq!(cfg.secure(false).security, FtpSecurityMode::Implicit);
    }

    #[test]
    fn rejects_bad_configs() {
        let err = FtpConnectionConfig::new("", 21, "u", None, false).unwrap_err();
        assert_eq!(err.kind, XferErrorKind::State);

        let half_cert = FtpConnectionConfig::new("h", 21, "u", None, false)
            .unwrap()
            .certs(None, Some("c.pem".into()), None);
        assert!(half_cert.validate().is_err());

        let mismatch = FtpConnectionConfig::new("h", 21, "u", None, false)
            .unwrap()
            .active_address(Ipv4Addr::LOCALHOST);
        assert!(mismatch.validate().is_err());
        assert!(mismatch.active_mode(0).validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: FtpConnectionConfig = serde_json::from_str(
            r#"{"host":"h","username":"u","dataChannel":{"mode":"active","listenPort":2121}}"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 21);
        assert_eq!(cfg.connect_timeout_sec, 10);
        assert_eq!(cfg.data_channel, DataChannelMode::Active { listen_port: 2121 });
        assert_eq!(cfg.password, None);
    }
}
