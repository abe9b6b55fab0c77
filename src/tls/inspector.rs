//! TLS handshake against a monitored host to read its leaf certificate.

use async_trait::async_trait;
use chrono::Utc;
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use super::certificate::{CertificateSnapshot, LeafCertificate};
use crate::error::InspectionError;

pub const HTTPS_PORT: u16 = 443;

/// Bound applied to the TCP connect and again to the TLS handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the certificate state of a domain.
///
/// Implementations never fail: any problem is reported as a snapshot with
/// `Error` status so one bad host cannot stall the others.
#[async_trait]
pub trait Inspector: Send + Sync {
    async fn inspect(&self, domain: &str) -> CertificateSnapshot;
}

/// Reduce user input such as `https://www.example.com/path` to a bare host.
///
/// Strips a leading URI scheme, a leading `www.` label and anything from the
/// first `/`, `?` or `#` onward. The result is lowercased.
pub fn normalize_domain(input: &str) -> String {
    let mut rest = input.trim();

    if let Some(idx) = rest.find("://") {
        let scheme = &rest[..idx];
        let is_scheme = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if is_scheme {
            rest = &rest[idx + 3..];
        }
    }

    if rest
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("www."))
    {
        rest = &rest[4..];
    }

    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[..end].to_ascii_lowercase()
}

/// Production inspector using the platform-independent webpki trust anchors
#[derive(Clone)]
pub struct TlsInspector {
    connector: TlsConnector,
    connect_timeout: Duration,
    port: u16,
}

impl TlsInspector {
    pub fn new(connect_timeout: Duration) -> Result<Self, InspectionError> {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            connect_timeout,
            port: HTTPS_PORT,
        })
    }

    /// Connect somewhere other than 443
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn read_leaf(&self, host: &str) -> Result<LeafCertificate, InspectionError> {
        if host.is_empty() {
            return Err(InspectionError::InvalidHost(host.to_string()));
        }
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| InspectionError::InvalidHost(host.to_string()))?;

        let stream = timeout(self.connect_timeout, TcpStream::connect((host, self.port)))
            .await
            .map_err(|_| InspectionError::Timeout {
                host: host.to_string(),
                after: self.connect_timeout,
            })?
            .map_err(|source| InspectionError::Connect {
                host: host.to_string(),
                port: self.port,
                source,
            })?;

        let tls_stream = timeout(self.connect_timeout, self.connector.connect(server_name, stream))
            .await
            .map_err(|_| InspectionError::Timeout {
                host: host.to_string(),
                after: self.connect_timeout,
            })?
            .map_err(|source| InspectionError::Handshake {
                host: host.to_string(),
                source,
            })?;

        let (_, connection) = tls_stream.get_ref();
        let leaf = connection
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| InspectionError::NoCertificate {
                host: host.to_string(),
            })?;

        LeafCertificate::from_der(host, leaf.as_ref())
    }
}

#[async_trait]
impl Inspector for TlsInspector {
    async fn inspect(&self, domain: &str) -> CertificateSnapshot {
        let host = normalize_domain(domain);

        match self.read_leaf(&host).await {
            Ok(leaf) => {
                let snapshot = CertificateSnapshot::from_validity(
                    domain,
                    host,
                    leaf.issuer_organization,
                    leaf.valid_from,
                    leaf.valid_until,
                    Utc::now(),
                );
                debug!(
                    "Certificate for {} expires {} ({:?} days)",
                    domain,
                    snapshot.expiry_date().unwrap_or_default(),
                    snapshot.days_until_expiry
                );
                snapshot
            }
            Err(e) => {
                warn!("Certificate inspection for {} failed: {}", domain, e);
                CertificateSnapshot::failed(domain, host, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::CertificateStatus;
    use std::time::Instant;

    #[test]
    fn test_normalize_strips_scheme_www_and_path() {
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("https://example.com"), "example.com");
        assert_eq!(normalize_domain("http://www.example.com/login"), "example.com");
        assert_eq!(normalize_domain("  www.Example.COM/  "), "example.com");
        assert_eq!(normalize_domain("https://api.example.com?x=1"), "api.example.com");
    }

    #[test]
    fn test_normalize_keeps_inner_www() {
        assert_eq!(normalize_domain("shop.www.example.com"), "shop.www.example.com");
        assert_eq!(normalize_domain("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_domain(""), "");
        assert_eq!(normalize_domain("https://"), "");
    }

    #[tokio::test]
    async fn test_inspect_empty_host_is_error() {
        let inspector = TlsInspector::new(Duration::from_secs(1)).unwrap();
        let snapshot = inspector.inspect("https:///").await;
        assert_eq!(snapshot.status, CertificateStatus::Error);
        assert_eq!(snapshot.domain, "https:///");
        assert!(snapshot.days_until_expiry.is_none());
    }

    #[tokio::test]
    async fn test_inspect_closed_port_is_error() {
        // Bind then drop to get a local port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let inspector = TlsInspector::new(Duration::from_secs(2))
            .unwrap()
            .with_port(port);
        let snapshot = inspector.inspect("127.0.0.1").await;

        assert_eq!(snapshot.status, CertificateStatus::Error);
        assert!(!snapshot.error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_inspect_unroutable_host_respects_timeout() {
        let bound = Duration::from_secs(1);
        let inspector = TlsInspector::new(bound).unwrap();

        let started = Instant::now();
        let snapshot = inspector.inspect("10.255.255.1").await;
        let elapsed = started.elapsed();

        assert_eq!(snapshot.status, CertificateStatus::Error);
        assert!(snapshot.error.is_some());
        // Connect and handshake are each bounded
        assert!(elapsed < bound * 2 + Duration::from_millis(500), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_inspect_plaintext_server_fails_handshake() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
            }
        });

        let inspector = TlsInspector::new(Duration::from_secs(2))
            .unwrap()
            .with_port(port);
        let snapshot = inspector.inspect("localhost").await;

        assert_eq!(snapshot.status, CertificateStatus::Error);
        assert_eq!(snapshot.host, "localhost");
    }
}
