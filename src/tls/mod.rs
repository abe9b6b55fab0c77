// Certificate inspection: TLS handshake against a monitored host and
// classification of the leaf certificate's validity window

pub mod certificate;
pub mod inspector;

pub use certificate::{CertificateSnapshot, CertificateStatus};
pub use inspector::{normalize_domain, Inspector, TlsInspector, HTTPS_PORT};
