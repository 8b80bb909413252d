//! Stateful FTP client. Owns the control connection and issues commands.
//!
//! Lifecycle: `connect()` (greeting, implicit TLS) → `authenticate()` →
//! `negotiate_options()` → operations → `quit()`.
//!
//! Every reply read is appended to the transcript, including the one that
//! made a command fail. The helpers here are used by `directory.rs`,
//! `file_ops.rs` and `transfer.rs`.

use crate::ftp::connection;
use crate::ftp::protocol::FtpCodec;
use crate::ftp::tls::SecureUpgrader;
use crate::ftp::types::{FtpConnectionConfig, FtpSecurityMode};
use filehop_core::{mask_secret, ControlResponse, XferError, XferResult};

/// An FTP client session.
pub struct FtpClient {
    config: FtpConnectionConfig,
    codec: Option<FtpCodec>,
    upgrader: Option<SecureUpgrader>,
    transcript: Vec<ControlResponse>,
}

impl FtpClient {
    pub fn new(config: FtpConnectionConfig) -> Self {
        Self {
            config,
            codec: None,
            upgrader: None,
            transcript: Vec::new(),
        }
    }

    pub fn config(&self) -> &FtpConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.codec.is_some()
    }

    /// Whether the control channel is currently wrapped in TLS.
    pub fn is_secure(&self) -> bool {
        self.codec.as_ref().map(FtpCodec::is_secure).unwrap_or(false)
    }

    /// Responses received so far, oldest first.
    pub fn transcript(&self) -> &[ControlResponse] {
        &self.transcript
    }

    pub fn take_transcript(&mut self) -> Vec<ControlResponse> {
        std::mem::take(&mut self.transcript)
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Dial, read the 220 greeting and, on implicit FTPS, secure the
    /// channel before any command is sent.
    ///
    /// On failure every transport opened so far is dropped.
    pub async fn connect(&mut self) -> XferResult<()> {
        if self.codec.is_some() {
            return Err(XferError::state("control connection already open"));
        }
        self.config.validate()?;
        let result = self.open_control().await;
        if result.is_err() {
            self.abandon();
        }
        result
    }

    async fn open_control(&mut self) -> XferResult<()> {
        let tcp = connection::dial(&self.config).await?;
        self.codec = Some(FtpCodec::new(Box::new(tcp)));
        self.read_reply("", 220).await?;

        if self.config.security == FtpSecurityMode::Implicit {
            self.secure_control().await?;
        }
        log::info!(
            "FTP control channel open to {}:{} ({:?})",
            self.config.host,
            self.config.port,
            self.config.security
        );
        Ok(())
    }

    /// AUTH TLS on explicit FTPS, then USER, then PASS when a password is
    /// configured.
    pub async fn authenticate(&mut self) -> XferResult<()> {
        if self.config.security == FtpSecurityMode::Explicit && !self.is_secure() {
            self.command("AUTH TLS", 234).await?;
            self.secure_control().await?;
        }
        let user = format!("USER {}", self.config.username);
        match self.config.password.clone() {
            Some(pass) => {
                self.command(&user, 331).await?;
                self.command(&format!("PASS {}", pass), 230).await?;
            }
            None => {
                self.command(&user, 230).await?;
            }
        }
        log::debug!("logged in as {}", self.config.username);
        Ok(())
    }

    /// SYST, FEAT, UTF-8 names, private data channel on FTPS, binary type.
    pub async fn negotiate_options(&mut self) -> XferResult<()> {
        self.command("SYST", 215).await?;
        self.command("FEAT", 211).await?;
        self.command("OPTS UTF8 ON", 200).await?;
        if self.config.is_secure() {
            self.command("PROT P", 200).await?;
        }
        self.command("TYPE I", 200).await?;
        Ok(())
    }

    /// Full session setup: connect, authenticate, negotiate options.
    pub async fn establish(&mut self) -> XferResult<()> {
        self.connect().await?;
        let result = async {
            self.authenticate().await?;
            self.negotiate_options().await
        }
        .await;
        if result.is_err() {
            self.abandon();
        }
        result
    }

    /// Send QUIT and close the connection whatever the reply was.
    pub async fn quit(&mut self) -> XferResult<ControlResponse> {
        let result = self.command("QUIT", 221).await;
        self.release().await;
        result
    }

    /// Close TLS (close_notify) and then the socket. Missing layers are
    /// skipped.
    pub async fn release(&mut self) {
        if let Some(mut codec) = self.codec.take() {
            codec.shutdown().await;
            log::debug!("FTP control channel to {} closed", self.config.host);
        }
    }

    /// Drop the connection without any goodbye. Used when the control
    /// channel can no longer be trusted to be in sync.
    pub fn abandon(&mut self) {
        if self.codec.take().is_some() {
            log::warn!("FTP control channel to {} abandoned", self.config.host);
        }
    }

    // ─── Command helpers ─────────────────────────────────────────

    /// Send `cmd` and require `expected` as the reply code.
    pub async fn command(&mut self, cmd: &str, expected: u16) -> XferResult<ControlResponse> {
        let codec = self
            .codec
            .as_mut()
            .ok_or_else(|| XferError::state("not connected"))?;
        if let Err(e) = codec.send_command(cmd).await {
            self.abandon();
            return Err(e);
        }
        self.read_reply(cmd, expected).await
    }

    /// Read one reply attributed to `command` (empty for unsolicited
    /// replies such as the greeting or 226) and require `expected`.
    pub async fn read_reply(&mut self, command: &str, expected: u16) -> XferResult<ControlResponse> {
        let codec = self
            .codec
            .as_mut()
            .ok_or_else(|| XferError::state("not connected"))?;
        let (code, message) = match codec.read_response().await {
            Ok(r) => r,
            Err(e) => {
                self.abandon();
                return Err(e);
            }
        };

        let command = mask_secret(command);
        let resp = ControlResponse::new(command.clone(), code, message);
        self.transcript.push(resp.clone());
        if code != expected {
            return Err(XferError::protocol(&command, expected, code, &resp.message));
        }
        Ok(resp)
    }

    // ─── TLS ─────────────────────────────────────────────────────

    async fn secure_control(&mut self) -> XferResult<()> {
        let codec = self
            .codec
            .take()
            .ok_or_else(|| XferError::state("not connected"))?;
        let raw = codec.into_inner()?;
        let upgrader = self.upgrader()?;
        let tls = upgrader.upgrade(raw).await?;
        self.codec = Some(FtpCodec::secured(tls));
        log::debug!("control channel secured");
        Ok(())
    }

    /// The session's TLS upgrader, built on first use.
    pub(crate) fn upgrader(&mut self) -> XferResult<SecureUpgrader> {
        match &self.upgrader {
            Some(u) => Ok(u.clone()),
            None => {
                let u = SecureUpgrader::new(
                    &self.config.host,
                    &self.config.tls,
                    self.config.connect_timeout(),
                )?;
                self.upgrader = Some(u.clone());
                Ok(u)
            }
        }
    }
}
