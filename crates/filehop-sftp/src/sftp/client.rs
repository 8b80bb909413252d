// ── SftpClient – one SSH session carrying SFTP ──────────────────────────────

use crate::sftp::types::SftpConnectionConfig;
use filehop_core::{XferError, XferResult};
use log::{debug, info, warn};
use ssh2::{Session, Sftp};
use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

pub struct SftpClient {
    config: SftpConnectionConfig,
    pub(crate) session: Option<Session>,
    pub(crate) sftp: Option<Sftp>,
}

impl SftpClient {
    pub fn new(config: SftpConnectionConfig) -> Self {
        Self {
            config,
            session: None,
            sftp: None,
        }
    }

    pub fn config(&self) -> &SftpConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    // ── Connect ──────────────────────────────────────────────────────────────

    /// Dial, handshake, authenticate and open the SFTP subsystem.
    pub async fn connect(&mut self) -> XferResult<()> {
        if self.session.is_some() {
            return Err(XferError::state("SSH session already open"));
        }
        self.config.validate()?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("SFTP connecting to {}", addr);

        let sock_addr = addr
            .to_socket_addrs()
            .map_err(|e| XferError::connection(format!("resolve '{}': {}", addr, e)))?
            .next()
            .ok_or_else(|| XferError::connection(format!("'{}' resolved to nothing", addr)))?;
        let tcp = TcpStream::connect_timeout(&sock_addr, self.config.timeout())
            .map_err(|e| XferError::connection(format!("TCP connection to {} failed: {}", addr, e)))?;

        let mut session =
            Session::new().map_err(|e| XferError::connection(format!("SSH session: {}", e)))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(self.config.timeout_ms());
        session
            .handshake()
            .map_err(|e| XferError::connection(format!("SSH handshake failed: {}", e)))?;

        let method = self.authenticate(&session)?;
        if !session.authenticated() {
            return Err(XferError::remote("not authenticated after auth attempt"));
        }
        info!("SFTP authenticated to {} via {}", addr, method);

        if self.config.keep_alive {
            session.set_keepalive(true, self.config.keepalive_interval_secs as u32);
        }
        let sftp = session
            .sftp()
            .map_err(|e| XferError::remote(format!("SFTP subsystem: {}", e)))?;

        self.session = Some(session);
        self.sftp = Some(sftp);
        Ok(())
    }

    // ── Authentication ───────────────────────────────────────────────────────

    fn authenticate(&self, session: &Session) -> XferResult<&'static str> {
        let user = &self.config.username;

        if let Some(ref key_path) = self.config.private_key_path {
            let passphrase = self.config.private_key_passphrase.as_deref();
            match session.userauth_pubkey_file(user, None, key_path, passphrase) {
                Ok(()) if session.authenticated() => return Ok("publickey"),
                Ok(()) => {}
                Err(e) if self.config.password.is_none() => {
                    return Err(XferError::remote(format!("public-key auth failed: {}", e)))
                }
                Err(e) => warn!("public-key auth failed, trying password: {}", e),
            }
        }

        if let Some(ref password) = self.config.password {
            session
                .userauth_password(user, password)
                .map_err(|e| XferError::remote(format!("password auth failed: {}", e)))?;
            if session.authenticated() {
                return Ok("password");
            }
        }

        Err(XferError::remote("no authentication method succeeded"))
    }

    // ── Disconnect ───────────────────────────────────────────────────────────

    /// Close the SFTP channel, then the SSH session. Safe to call twice.
    pub async fn quit(&mut self) -> XferResult<()> {
        self.sftp.take();
        if let Some(session) = self.session.take() {
            if let Err(e) = session.disconnect(None, "Client disconnecting", None) {
                warn!("SFTP disconnect from {}: {}", self.config.host, e);
            }
            info!("SFTP session to {} closed", self.config.host);
        }
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    pub(crate) fn sftp(&self) -> XferResult<&Sftp> {
        self.sftp.as_ref().ok_or_else(|| XferError::state("not connected"))
    }

    /// Run `command` in an exec channel and return its stdout.
    /// A non-zero exit status is a remote error carrying stderr.
    pub async fn run_shell(&mut self, command: &str) -> XferResult<Vec<u8>> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| XferError::state("not connected"))?;
        let mut channel = session
            .channel_session()
            .map_err(|e| XferError::remote(format!("exec channel: {}", e)))?;
        channel
            .exec(command)
            .map_err(|e| XferError::remote(format!("exec '{}': {}", command, e)))?;

        // Both streams share one channel window; drain them together.
        session.set_blocking(false);
        let drained = drain_both(
            &mut channel.stream(0),
            &mut channel.stderr(),
            self.config.timeout(),
        );
        session.set_blocking(true);
        let (stdout, stderr) = drained
            .map_err(|e| XferError::transfer(format!("reading '{}' output: {}", command, e)))?;
        channel
            .wait_close()
            .map_err(|e| XferError::remote(format!("closing exec channel: {}", e)))?;

        let status = channel.exit_status().unwrap_or(-1);
        if status != 0 {
            return Err(XferError::remote(format!(
                "'{}' exited with {}: {}",
                command,
                status,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

/// Read `stdout` and `stderr` to EOF, alternating so a full stderr cannot
/// stall stdout. `WouldBlock` means no data yet; `idle` bounds the wait
/// without progress. A failing stderr is logged and dropped.
fn drain_both<O, E>(
    stdout: &mut O,
    stderr: &mut E,
    idle: Duration,
) -> io::Result<(Vec<u8>, String)>
where
    O: Read + ?Sized,
    E: Read + ?Sized,
{
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut buf = [0u8; 16 * 1024];
    let (mut out_done, mut err_done) = (false, false);
    let mut last_progress = Instant::now();

    while !(out_done && err_done) {
        let mut progressed = false;
        if !out_done {
            match stdout.read(&mut buf) {
                Ok(0) => out_done = true,
                Ok(n) => {
                    out.extend_from_slice(&buf[..n]);
                    progressed = true;
                }
                Err(e) if is_retry(&e) => {}
                Err(e) => return Err(e),
            }
        }
        if !err_done {
            match stderr.read(&mut buf) {
                Ok(0) => err_done = true,
                Ok(n) => {
                    err.extend_from_slice(&buf[..n]);
                    progressed = true;
                }
                Err(e) if is_retry(&e) => {}
                Err(e) => {
                    debug!("discarding stderr after read error: {}", e);
                    err_done = true;
                }
            }
        }

        if progressed {
            last_progress = Instant::now();
        } else if !(out_done && err_done) {
            if last_progress.elapsed() >= idle {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "no output from remote command",
                ));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
    Ok((out, String::from_utf8_lossy(&err).into_owned()))
}

fn is_retry(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
