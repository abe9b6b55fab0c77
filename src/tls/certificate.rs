use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InspectionError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Classification of an inspected certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Expired,
    Error,
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateStatus::Valid => write!(f, "Valid"),
            CertificateStatus::Expired => write!(f, "Expired"),
            CertificateStatus::Error => write!(f, "Error"),
        }
    }
}

/// Point-in-time read of a domain's certificate. Recomputed on every
/// inspection and never persisted.
///
/// An `Error` snapshot carries no issuer, validity window or day count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSnapshot {
    /// Domain as supplied, kept for display
    pub domain: String,
    /// Bare hostname used for the connection
    pub host: String,
    /// Issuer organization name
    pub issuer: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    /// Whole days left, floored; negative once expired
    pub days_until_expiry: Option<i64>,
    pub status: CertificateStatus,
    pub error: Option<String>,
}

impl CertificateSnapshot {
    /// Classify a validity window as seen at `now`
    pub fn from_validity(
        domain: impl Into<String>,
        host: impl Into<String>,
        issuer: Option<String>,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let days = days_until(valid_until, now);
        Self {
            domain: domain.into(),
            host: host.into(),
            issuer,
            valid_from: Some(valid_from),
            valid_until: Some(valid_until),
            days_until_expiry: Some(days),
            status: if days > 0 {
                CertificateStatus::Valid
            } else {
                CertificateStatus::Expired
            },
            error: None,
        }
    }

    /// Snapshot for a host that could not be inspected
    pub fn failed(domain: impl Into<String>, host: impl Into<String>, error: &InspectionError) -> Self {
        Self {
            domain: domain.into(),
            host: host.into(),
            issuer: None,
            valid_from: None,
            valid_until: None,
            days_until_expiry: None,
            status: CertificateStatus::Error,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == CertificateStatus::Error
    }

    /// Expiry day as `YYYY-MM-DD`
    pub fn expiry_date(&self) -> Option<String> {
        self.valid_until.map(|t| t.format("%Y-%m-%d").to_string())
    }

    pub fn issuer_or_unknown(&self) -> &str {
        self.issuer.as_deref().unwrap_or("Unknown")
    }
}

/// Calendar days between `now` and `valid_until`, floored toward negative
/// infinity so a certificate that lapsed an hour ago reads -1.
pub fn days_until(valid_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (valid_until - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Fields pulled from a DER-encoded leaf certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertificate {
    pub issuer_organization: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl LeafCertificate {
    pub fn from_der(host: &str, der: &[u8]) -> Result<Self, InspectionError> {
        use x509_parser::parse_x509_certificate;

        let malformed = |message: String| InspectionError::Certificate {
            host: host.to_string(),
            message,
        };

        let (_, x509) = parse_x509_certificate(der)
            .map_err(|e| malformed(format!("failed to parse X.509 certificate: {}", e)))?;

        let validity = x509.validity();
        let valid_from = asn1_to_utc(&validity.not_before)
            .ok_or_else(|| malformed("notBefore is out of range".to_string()))?;
        let valid_until = asn1_to_utc(&validity.not_after)
            .ok_or_else(|| malformed("notAfter is out of range".to_string()))?;

        let issuer_organization = x509
            .issuer()
            .iter_organization()
            .next()
            .and_then(|attr| attr.as_str().ok())
            .map(str::to_string);

        Ok(Self {
            issuer_organization,
            valid_from,
            valid_until,
        })
    }
}

fn asn1_to_utc(time: &x509_parser::time::ASN1Time) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(time.timestamp(), 0).single()
}
