//! Shared types for the filehop crates.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Control channel ─────────────────────────────────────────────────

/// One command/response exchange on an FTP control channel.
///
/// `command` is empty for the server greeting. Multi-line replies are
/// folded into a single `message` joined with `\n`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    pub command: String,
    pub code: u16,
    pub message: String,
}

impl ControlResponse {
    pub fn new(command: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            code,
            message: message.into(),
        }
    }

    /// The greeting carries no command text.
    pub fn greeting(code: u16, message: impl Into<String>) -> Self {
        Self::new(String::new(), code, message)
    }

    /// Whether this is a positive-completion reply (2xx).
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for ControlResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.command.is_empty() {
            write!(f, "{} {}", self.code, self.message)
        } else {
            write!(f, "{} -> {} {}", self.command, self.code, self.message)
        }
    }
}

/// Connectivity of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    #[default]
    Offline,
    Online,
}

/// Direction of a file transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransferDirection {
    Upload,
    Download,
}

// ─── Directory listing ───────────────────────────────────────────────

/// File type encoded by the first character of an `ls -l` row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntityType {
    Directory,
    Regular,
    Symlink,
    Pipe,
    Socket,
    CharacterDevice,
    BlockDevice,
}

impl EntityType {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(Self::Directory),
            '-' => Some(Self::Regular),
            'l' => Some(Self::Symlink),
            'p' => Some(Self::Pipe),
            's' => Some(Self::Socket),
            'c' => Some(Self::CharacterDevice),
            'b' => Some(Self::BlockDevice),
            _ => None,
        }
    }
}

/// Read/write/execute flags for one principal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub sticky: bool,
    pub setuid: bool,
    pub setgid: bool,
    pub owner: Permission,
    pub group: Permission,
    pub other: Permission,
}

/// One parsed row of a Unix directory listing.
///
/// `last_modified` is the date token exactly as listed ("Jan  5 08:00" or
/// "Jan  5  2024"); `name` is the rest of the line, so a symlink keeps its
/// `-> target` suffix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub permissions: Permissions,
    pub links: u32,
    pub owner: String,
    pub group: String,
    pub size: u64,
    pub last_modified: String,
    pub name: String,
}

impl Entity {
    pub fn is_dir(&self) -> bool {
        self.permissions.entity_type == EntityType::Directory
    }
}
