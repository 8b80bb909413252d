//! In-process FTP server for integration tests.
//!
//! Answers the login/negotiation sequence with canned success codes,
//! serves PASV and PORT data channels, and records every command line it
//! receives. Individual verbs can be forced to a different reply. With a
//! TLS config it also speaks explicit FTPS.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use filehop_ftp::AsyncStream;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

pub const LISTING: &str = "total 12\r\n\
drwxr-xr-x   2 ftp ftp  4096 Mar  1  2023 pub\r\n\
-rw-r--r--   1 ftp ftp  1234 Jan  5 08:00 readme.txt\r\n\
lrwxrwxrwx   1 ftp ftp    10 Jan  5 08:00 latest -> pub/v2\r\n";

#[derive(Clone)]
pub struct Behaviour {
    /// Body served for LIST.
    pub listing: String,
    /// Body served for RETR.
    pub file: Vec<u8>,
    /// Verb → raw reply line replacing the default answer.
    pub overrides: HashMap<&'static str, String>,
    /// Whether to dial the PORT address for active transfers.
    pub connect_back: bool,
    /// Answer AUTH TLS and protect data channels after PROT P.
    pub tls: Option<Arc<ServerConfig>>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            listing: LISTING.to_string(),
            file: b"remote file contents".to_vec(),
            overrides: HashMap::new(),
            connect_back: true,
            tls: None,
        }
    }
}

impl Behaviour {
    pub fn reply(mut self, verb: &'static str, line: &str) -> Self {
        self.overrides.insert(verb, line.to_string());
        self
    }
}

#[derive(Default)]
struct Recorded {
    commands: Vec<String>,
    uploads: Vec<Vec<u8>>,
    connections: usize,
}

pub struct MockFtpServer {
    pub port: u16,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockFtpServer {
    pub async fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let recorded = Arc::new(Mutex::new(Recorded::default()));

        let rec = recorded.clone();
        tokio::spawn(async move {
            while let Ok((sock, _)) = listener.accept().await {
                rec.lock().unwrap().connections += 1;
                let b = behaviour.clone();
                let r = rec.clone();
                tokio::spawn(async move {
                    let _ = serve(sock, b, r).await;
                });
            }
        });
        Self { port, recorded }
    }

    pub fn commands(&self) -> Vec<String> {
        self.recorded.lock().unwrap().commands.clone()
    }

    pub fn uploads(&self) -> Vec<Vec<u8>> {
        self.recorded.lock().unwrap().uploads.clone()
    }

    pub fn connections(&self) -> usize {
        self.recorded.lock().unwrap().connections
    }
}

enum DataSetup {
    None,
    Passive(TcpListener),
    Active(SocketAddr),
}

type Io = Box<dyn AsyncStream>;

async fn serve(sock: TcpStream, b: Behaviour, rec: Arc<Mutex<Recorded>>) -> std::io::Result<()> {
    let mut ctl: BufReader<Io> = BufReader::new(Box::new(sock));
    send(&mut ctl, "220 mock ready").await?;

    let mut data = DataSetup::None;
    let mut private_data = false;
    loop {
        let mut line = String::new();
        if ctl.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let line = line.trim_end().to_string();
        rec.lock().unwrap().commands.push(line.clone());
        let verb = line.split(' ').next().unwrap_or("").to_ascii_uppercase();

        if let Some(reply) = b.overrides.get(verb.as_str()) {
            send(&mut ctl, reply).await?;
            continue;
        }

        match verb.as_str() {
            "AUTH" => match &b.tls {
                Some(cfg) => {
                    send(&mut ctl, "234 AUTH TLS ok").await?;
                    let plain = ctl.into_inner();
                    let tls = TlsAcceptor::from(cfg.clone()).accept(plain).await?;
                    ctl = BufReader::new(Box::new(tls));
                }
                None => send(&mut ctl, "502 no TLS here").await?,
            },
            "USER" => send(&mut ctl, "331 password please").await?,
            "PASS" => send(&mut ctl, "230 logged in").await?,
            "SYST" => send(&mut ctl, "215 UNIX Type: L8").await?,
            "FEAT" => send(&mut ctl, "211-Features:\r\n UTF8\r\n PASV\r\n211 End").await?,
            "PROT" => {
                private_data = line.ends_with(" P");
                send(&mut ctl, "200 ok").await?;
            }
            "OPTS" | "TYPE" => send(&mut ctl, "200 ok").await?,
            "PASV" => {
                let l = TcpListener::bind("127.0.0.1:0").await?;
                let p = l.local_addr()?.port();
                data = DataSetup::Passive(l);
                let reply = format!("227 Entering Passive Mode (127,0,0,1,{},{}).", p >> 8, p & 0xff);
                send(&mut ctl, &reply).await?;
            }
            "PORT" => {
                let arg = line.split(' ').nth(1).unwrap_or("");
                let n: Vec<u16> = arg.split(',').filter_map(|x| x.parse().ok()).collect();
                if n.len() != 6 {
                    send(&mut ctl, "501 bad PORT").await?;
                    continue;
                }
                let addr = format!("{}.{}.{}.{}:{}", n[0], n[1], n[2], n[3], n[4] * 256 + n[5]);
                data = DataSetup::Active(addr.parse().unwrap());
                send(&mut ctl, "200 PORT ok").await?;
            }
            "LIST" | "RETR" | "STOR" => {
                let setup = std::mem::replace(&mut data, DataSetup::None);
                let tcp = open_data(setup, b.connect_back).await?;
                send(&mut ctl, "150 opening data connection").await?;
                // Without a connection the client is left waiting for one.
                let Some(tcp) = tcp else { continue };

                // The client starts its handshake only after the 150.
                let mut stream: Io = match (&b.tls, private_data) {
                    (Some(cfg), true) => Box::new(TlsAcceptor::from(cfg.clone()).accept(tcp).await?),
                    _ => Box::new(tcp),
                };
                match verb.as_str() {
                    "LIST" => stream.write_all(b.listing.as_bytes()).await?,
                    "RETR" => stream.write_all(&b.file).await?,
                    _ => {
                        let mut got = Vec::new();
                        stream.read_to_end(&mut got).await?;
                        rec.lock().unwrap().uploads.push(got);
                    }
                }
                let _ = stream.shutdown().await;
                drop(stream);
                send(&mut ctl, "226 transfer complete").await?;
            }
            "MKD" => send(&mut ctl, "257 \"dir\" created").await?,
            "RMD" | "DELE" | "RNTO" => send(&mut ctl, "250 ok").await?,
            "RNFR" => send(&mut ctl, "350 ready for RNTO").await?,
            "QUIT" => {
                send(&mut ctl, "221 bye").await?;
                let _ = ctl.get_mut().shutdown().await;
                return Ok(());
            }
            _ => send(&mut ctl, "502 not implemented").await?,
        }
    }
}

async fn open_data(setup: DataSetup, connect_back: bool) -> std::io::Result<Option<TcpStream>> {
    match setup {
        DataSetup::Passive(l) => {
            let (s, _) = tokio::time::timeout(Duration::from_secs(5), l.accept())
                .await
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "no PASV dial"))??;
            Ok(Some(s))
        }
        DataSetup::Active(addr) if connect_back => Ok(Some(TcpStream::connect(addr).await?)),
        DataSetup::Active(_) => Ok(None),
        DataSetup::None => Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "transfer without PASV/PORT",
        )),
    }
}

async fn send(ctl: &mut BufReader<Io>, reply: &str) -> std::io::Result<()> {
    let w = ctl.get_mut();
    w.write_all(format!("{}\r\n", reply).as_bytes()).await?;
    w.flush().await
}

/// Self-signed server config for FTPS tests; clients must trust all.
pub fn tls_server_config() -> Arc<ServerConfig> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_der = CertificateDer::from(cert.serialize_der().unwrap());
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.serialize_private_key_der()));
    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert_der], key_der)
            .unwrap();
    // Uploading clients never read after the handshake; unread tickets
    // would turn their close into a reset.
    config.send_tls13_tickets = 0;
    Arc::new(config)
}

/// Accepts one connection and sends a plaintext 220. With `explicit` it
/// then accepts one command with 234. After that it answers the TLS
/// ClientHello with garbage. Returns everything the client sent.
pub async fn start_broken_tls_server(explicit: bool) -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        sock.write_all(b"220 ready\r\n").await.unwrap();
        let mut seen = Vec::new();
        if explicit {
            // Byte-wise so the ClientHello is not swallowed with the line.
            let mut byte = [0u8; 1];
            while sock.read_exact(&mut byte).await.is_ok() {
                seen.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            sock.write_all(b"234 go ahead\r\n").await.unwrap();
        }
        let mut buf = vec![0u8; 4096];
        if let Ok(Ok(n)) = tokio::time::timeout(Duration::from_secs(5), sock.read(&mut buf)).await {
            seen.extend_from_slice(&buf[..n]);
        }
        let _ = sock.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
        let _ = sock.shutdown().await;
        // Keep reading until the client hangs up.
        loop {
            match tokio::time::timeout(Duration::from_secs(5), sock.read(&mut buf)).await {
                Ok(Ok(n)) if n > 0 => seen.extend_from_slice(&buf[..n]),
                _ => break,
            }
        }
        seen
    });
    (port, handle)
}
