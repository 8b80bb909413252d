//! Low-level FTP command/response codec (RFC 959 §4).
//!
//! Handles:
//! - Sending FTP commands terminated with `\r\n`
//! - Reading one reply, folding `NNN-` continuation lines into it
//! - Parsing the 3-digit reply code

use filehop_core::{mask_secret, XferError, XferResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Anything the control or data channel can run over: a TCP socket, a TLS
/// session wrapping one, or an in-memory pipe in tests.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// The FTP command/response codec over a buffered stream.
pub struct FtpCodec {
    stream: BufReader<BoxedStream>,
    secure: bool,
}

impl FtpCodec {
    /// Create a codec over a plain transport.
    pub fn new(stream: BoxedStream) -> Self {
        Self {
            stream: BufReader::new(stream),
            secure: false,
        }
    }

    /// Create a codec over a stream that already carries TLS.
    pub fn secured(stream: BoxedStream) -> Self {
        Self {
            stream: BufReader::new(stream),
            secure: true,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Send one command line; the CRLF terminator is appended here.
    pub async fn send_command(&mut self, cmd: &str) -> XferResult<()> {
        let line = format!("{}\r\n", cmd);
        let w = self.stream.get_mut();
        w.write_all(line.as_bytes())
            .await
            .map_err(|e| XferError::connection(format!("control write failed: {}", e)))?;
        w.flush()
            .await
            .map_err(|e| XferError::connection(format!("control flush failed: {}", e)))?;
        log::trace!(">>> {}", mask_secret(cmd));
        Ok(())
    }

    /// Read a single line from the control channel, without its line ending.
    async fn read_line(&mut self) -> XferResult<String> {
        let mut buf = String::new();
        let n = self
            .stream
            .read_line(&mut buf)
            .await
            .map_err(|e| XferError::connection(format!("control read failed: {}", e)))?;
        if n == 0 {
            return Err(XferError::connection("server closed the control connection"));
        }
        Ok(buf.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read one complete reply and return its code and message text.
    ///
    /// Multi-line replies look like:
    /// ```text
    /// 211-Features:
    ///  UTF8
    /// 211 End
    /// ```
    /// and are returned as one message with the lines joined by `\n`.
    pub async fn read_response(&mut self) -> XferResult<(u16, String)> {
        let first = self.read_line().await?;
        let code = parse_code(&first)?;
        let mut lines = vec![strip_code(&first).to_string()];

        if first.as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{} ", code);
            loop {
                let next = self.read_line().await?;
                if next.starts_with(&terminator) || next == terminator.trim_end() {
                    lines.push(strip_code(&next).to_string());
                    break;
                }
                lines.push(next);
            }
        }

        let message = lines.join("\n");
        log::trace!("<<< {} {}", code, message);
        Ok((code, message))
    }

    /// Give the transport back, e.g. to wrap it in TLS.
    ///
    /// Fails if the server sent bytes that are still sitting in the read
    /// buffer, since they would be lost under the new layer.
    pub fn into_inner(self) -> XferResult<BoxedStream> {
        if !self.stream.buffer().is_empty() {
            return Err(XferError::remote(
                "unexpected data on the control channel before TLS negotiation",
            ));
        }
        Ok(self.stream.into_inner())
    }

    /// Close the stream: TLS close_notify first (if any), then the socket.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.stream.get_mut().shutdown().await {
            log::debug!("control channel shutdown: {}", e);
        }
    }
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> XferResult<u16> {
    let digits = line.get(..3).filter(|d| d.bytes().all(|b| b.is_ascii_digit()));
    let sep_ok = matches!(line.as_bytes().get(3), None | Some(b' ') | Some(b'-'));
    match digits {
        Some(d) if sep_ok => d
            .parse::<u16>()
            .map_err(|_| XferError::parse(format!("invalid reply code in: '{}'", line))),
        _ => Err(XferError::parse(format!("malformed reply line: '{}'", line))),
    }
}

fn strip_code(line: &str) -> &str {
    line.get(4..).unwrap_or("")
}
