//! Error taxonomy shared by the FTP and SFTP engines.

use crate::types::ControlResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised transfer error.
///
/// Errors are never recovered inside the engines; they travel up to the
/// caller together with the control-channel responses exchanged so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XferError {
    pub kind: XferErrorKind,
    pub message: String,
    /// Reply code actually received, for protocol errors.
    pub code: Option<u16>,
    /// Command whose reply did not match.
    pub command: Option<String>,
    /// Reply code the command required.
    pub expected: Option<u16>,
    /// Responses exchanged before the failure, oldest first.
    #[serde(default)]
    pub trace: Vec<ControlResponse>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum XferErrorKind {
    /// DNS / dial failure, or the peer went away before a reply.
    Connection,
    /// TLS configuration, handshake or certificate failure.
    Tls,
    /// A reply code other than the one the command requires.
    Protocol,
    /// PASV reply or listing text outside the expected grammar.
    Parse,
    /// Operation not allowed in the current session state or channel mode.
    State,
    /// Local or data-channel I/O failure while copying bytes.
    Transfer,
    /// Port not representable as two bytes.
    Codec,
}

pub type XferResult<T> = Result<T, XferError>;

// ── Construction helpers ─────────────────────────────────────────────

impl XferError {
    pub fn new(kind: XferErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
            command: None,
            expected: None,
            trace: Vec::new(),
        }
    }

    /// Attach the response trace accumulated up to the failure.
    pub fn with_trace(mut self, trace: Vec<ControlResponse>) -> Self {
        self.trace = trace;
        self
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::Connection, msg)
    }

    pub fn tls(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::Tls, msg)
    }

    /// A reply that does not carry the code `command` requires.
    pub fn protocol(command: &str, expected: u16, actual: u16, message: &str) -> Self {
        Self {
            kind: XferErrorKind::Protocol,
            message: message.to_string(),
            code: Some(actual),
            command: Some(command.to_string()),
            expected: Some(expected),
            trace: Vec::new(),
        }
    }

    /// A remote failure with no reply code (SFTP status, stray control data).
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::Protocol, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::Parse, msg)
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::State, msg)
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::Transfer, msg)
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::Codec, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(XferErrorKind::State, format!("invalid configuration: {}", msg.into()))
    }

    pub fn is_timeout(&self) -> bool {
        self.message.contains("timed out")
    }
}

impl fmt::Display for XferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.command, self.expected, self.code) {
            (Some(cmd), Some(expected), Some(code)) => write!(
                f,
                "[{:?}] '{}' expected {} but got {}: {}",
                self.kind,
                mask_secret(cmd),
                expected,
                code,
                self.message
            ),
            (_, _, Some(code)) => write!(f, "[{:?} {}] {}", self.kind, code, self.message),
            _ => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for XferError {}

impl From<std::io::Error> for XferError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::transfer(format!("I/O timed out: {}", e))
        } else {
            Self::transfer(e.to_string())
        }
    }
}

/// Hide the argument of `PASS` when a command line is echoed.
pub fn mask_secret(command: &str) -> String {
    match command.split_once(' ') {
        Some((verb, _)) if verb.eq_ignore_ascii_case("PASS") => format!("{} ****", verb),
        _ => command.to_string(),
    }
}
