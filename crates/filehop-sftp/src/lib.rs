pub mod sftp;

pub use sftp::*;
