//! Error types for the monitoring core.
//!
//! None of these are fatal to the process. Inspection failures become an
//! `error` snapshot, report failures drop the attachment, delivery failures are
//! logged and dropped.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to read a certificate from a host
#[derive(Debug, Error)]
pub enum InspectionError {
    /// Input did not yield a usable hostname
    #[error("invalid hostname: {0:?}")]
    InvalidHost(String),

    /// DNS resolution or TCP connect failed
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Connect or handshake did not finish in time
    #[error("timed out after {after:?} connecting to {host}")]
    Timeout { host: String, after: Duration },

    /// TLS handshake or certificate verification failed
    #[error("TLS handshake with {host} failed: {source}")]
    Handshake {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Handshake completed but the server presented no certificate
    #[error("{host} presented no certificate")]
    NoCertificate { host: String },

    /// Leaf certificate could not be parsed
    #[error("malformed certificate from {host}: {message}")]
    Certificate { host: String, message: String },

    /// TLS client configuration could not be built
    #[error("TLS client configuration error: {0}")]
    Config(#[from] rustls::Error),

    /// The spawned inspection task panicked or was aborted
    #[error("inspection task failed: {0}")]
    Task(String),
}

/// Failure to transmit an alert
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no recipients configured")]
    NoRecipients,

    #[error("invalid email address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build alert message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("invalid attachment content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("delivery task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure to render a summary document
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(String),
}

impl From<printpdf::Error> for ReportError {
    fn from(err: printpdf::Error) -> Self {
        ReportError::Render(err.to_string())
    }
}

/// Failure to read or write the recipient list
#[derive(Debug, Error)]
pub enum RecipientStoreError {
    #[error("failed to access recipient file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("recipient file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
