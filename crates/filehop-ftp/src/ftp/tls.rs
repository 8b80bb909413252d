//! TLS for Explicit and Implicit FTPS (RFC 4217), built on rustls.
//!
//! One `ClientConfig` is built per session and shared by the control
//! channel and every data channel, so data connections can resume the
//! control channel's TLS session.

use crate::ftp::protocol::BoxedStream;
use crate::ftp::types::TlsOptions;
use filehop_core::{XferError, XferResult};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls::SupportedCipherSuite;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

/// AES-GCM suites with forward secrecy only.
pub fn allowed_cipher_suites() -> Vec<SupportedCipherSuite> {
    vec![
        ring::cipher_suite::TLS13_AES_256_GCM_SHA384,
        ring::cipher_suite::TLS13_AES_128_GCM_SHA256,
        ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    ]
}

/// Build the client configuration: TLS 1.2+, restricted suites, the
/// configured trust roots and optional client certificate.
pub fn build_client_config(opts: &TlsOptions) -> XferResult<Arc<ClientConfig>> {
    let provider = CryptoProvider {
        cipher_suites: allowed_cipher_suites(),
        ..ring::default_provider()
    };
    let builder = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
        .map_err(|e| XferError::tls(format!("TLS protocol setup: {}", e)))?;

    let builder = if opts.trust_all {
        log::warn!("FTPS certificate verification disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
    } else {
        builder.with_root_certificates(root_store(opts.root_ca_path.as_deref())?)
    };

    let config = match (&opts.client_cert_path, &opts.client_key_path) {
        (Some(cert), Some(key)) => builder
            .with_client_auth_cert(load_certs(cert)?, load_key(key)?)
            .map_err(|e| XferError::tls(format!("client certificate: {}", e)))?,
        (None, None) => builder.with_no_client_auth(),
        _ => {
            return Err(XferError::tls(
                "client certificate and key must be given together",
            ))
        }
    };
    Ok(Arc::new(config))
}

fn root_store(ca_path: Option<&Path>) -> XferResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    match ca_path {
        Some(path) => {
            for cert in load_certs(path)? {
                roots
                    .add(cert)
                    .map_err(|e| XferError::tls(format!("root CA {}: {}", path.display(), e)))?;
            }
        }
        None => {
            let native = rustls_native_certs::load_native_certs();
            for e in &native.errors {
                log::debug!("native root store: {}", e);
            }
            let (added, ignored) = roots.add_parsable_certificates(native.certs);
            log::debug!("loaded {} native roots ({} ignored)", added, ignored);
        }
    }
    if roots.is_empty() {
        return Err(XferError::tls("no trusted root certificates available"));
    }
    Ok(roots)
}

fn load_certs(path: &Path) -> XferResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| XferError::tls(format!("cannot open {}: {}", path.display(), e)))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| XferError::tls(format!("bad PEM in {}: {}", path.display(), e)))?;
    if certs.is_empty() {
        return Err(XferError::tls(format!("no certificates in {}", path.display())));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> XferResult<PrivateKeyDer<'static>> {
    let file = File::open(path)
        .map_err(|e| XferError::tls(format!("cannot open {}: {}", path.display(), e)))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| XferError::tls(format!("bad PEM in {}: {}", path.display(), e)))?
        .ok_or_else(|| XferError::tls(format!("no private key in {}", path.display())))
}

/// Wraps plain streams in TLS for one server.
#[derive(Clone)]
pub struct SecureUpgrader {
    connector: TlsConnector,
    server_name: ServerName<'static>,
    handshake_timeout: Duration,
}

impl SecureUpgrader {
    pub fn new(host: &str, opts: &TlsOptions, handshake_timeout: Duration) -> XferResult<Self> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| XferError::tls(format!("invalid server name '{}': {}", host, e)))?;
        Ok(Self {
            connector: TlsConnector::from(build_client_config(opts)?),
            server_name,
            handshake_timeout,
        })
    }

    /// Run the client handshake over `stream`.
    pub async fn upgrade(&self, stream: BoxedStream) -> XferResult<BoxedStream> {
        let handshake = self.connector.connect(self.server_name.clone(), stream);
        let tls = timeout(self.handshake_timeout, handshake)
            .await
            .map_err(|_| XferError::tls("TLS handshake timed out"))?
            .map_err(|e| XferError::tls(format!("TLS handshake: {}", e)))?;
        Ok(Box::new(tls))
    }
}

// ─── Certificate bypass ──────────────────────────────────────────────

#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filehop_core::XferErrorKind;
    use std::io::Write;

    #[test]
    fn trust_all_config_builds() {
        let opts = TlsOptions {
            trust_all: true,
            ..Default::default()
        };
        assert!(build_client_config(&opts).is_ok());
    }

    #[test]
    fn suites_are_gcm_only() {
        for suite in allowed_cipher_suites() {
            let name = format!("{:?}", suite.suite());
            assert!(name.contains("GCM"), "{}", name);
        }
    }

    #[test]
    fn empty_root_bundle_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "not a certificate").unwrap();
        let opts = TlsOptions {
            root_ca_path: Some(f.path().to_path_buf()),
            ..Default::default()
        };
        let err = build_client_config(&opts).unwrap_err();
        assert_eq!(err.kind, XferErrorKind::Tls);
    }

    #[test]
    fn missing_key_file_is_tls_error() {
        let opts = TlsOptions {
            trust_all: true,
            client_cert_path: Some("/nonexistent/cert.pem".into()),
            client_key_path: Some("/nonexistent/key.pem".into()),
            ..Default::default()
        };
        assert_eq!(build_client_config(&opts).unwrap_err().kind, XferErrorKind::Tls);
    }

    #[tokio::test]
    async fn handshake_failure_is_tls_error() {
        use tokio::io::AsyncWriteExt;
        let (client, mut server) = tokio::io::duplex(1024);
        let upgrader = SecureUpgrader::new(
            "localhost",
            &TlsOptions {
                trust_all: true,
                ..Default::default()
            },
            Duration::from_secs(5),
        )
        .unwrap();
        tokio::spawn(async move {
            let _ = server.write_all(b"this is not a TLS record\r\n").await;
        });
        let err = match upgrader.upgrade(Box::new(client)).await {
            Err(e) => e,
            Ok(_) => panic!("handshake should fail"),
        };
        assert_eq!(err.kind, XferErrorKind::Tls);
    }
}
