// ── filehop-sftp / sftp module ────────────────────────────────────────────────
//
// SFTP engine over an ssh2 session:
//   • Password or private-key authentication
//   • Directory listing through a remote `ls -al`, parsed like FTP LIST
//   • Upload / download, mkdir / rmdir, rename / delete

pub mod client;
pub mod dir_ops;
pub mod file_ops;
pub mod types;

pub use client::{shell_quote, SftpClient};
pub use types::*;
