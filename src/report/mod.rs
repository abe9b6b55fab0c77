// Summary report of every monitored certificate. The core treats the rendered
// document as opaque bytes that are attached to alerts or downloaded.

pub mod pdf;

use serde::Serialize;

use crate::error::ReportError;
use crate::tls::{CertificateSnapshot, CertificateStatus};

pub use pdf::PdfReport;

const CELL_WIDTH: usize = 20;

pub trait ReportRenderer: Send + Sync {
    /// `alert_window_days` decides which certificates count as expiring in
    /// the summary, the same window the ledger alerts on.
    fn render(
        &self,
        snapshots: &[CertificateSnapshot],
        alert_window_days: i64,
    ) -> Result<Vec<u8>, ReportError>;

    /// MIME type of the rendered document
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// Counts shown on the dashboard and at the foot of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub valid: usize,
    pub expiring: usize,
    pub errors: usize,
}

impl ReportSummary {
    /// `expiring` counts every readable certificate at or inside the window,
    /// already-expired ones included.
    pub fn from_snapshots(snapshots: &[CertificateSnapshot], alert_window_days: i64) -> Self {
        let mut summary = Self {
            total: snapshots.len(),
            ..Self::default()
        };
        for snapshot in snapshots {
            match snapshot.status {
                CertificateStatus::Valid => summary.valid += 1,
                CertificateStatus::Error => summary.errors += 1,
                CertificateStatus::Expired => {}
            }
            if snapshot
                .days_until_expiry
                .is_some_and(|days| days <= alert_window_days)
            {
                summary.expiring += 1;
            }
        }
        summary
    }
}

/// One table row, already formatted for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub domain: String,
    pub status: String,
    pub days_left: String,
    pub expiry_date: String,
    pub issuer: String,
}

impl ReportRow {
    pub const HEADERS: [&'static str; 5] = ["Domain", "Status", "Days Left", "Expiry Date", "Issuer"];

    pub fn from_snapshot(snapshot: &CertificateSnapshot) -> Self {
        let domain = truncate(&snapshot.domain, CELL_WIDTH);
        match (snapshot.status, snapshot.days_until_expiry) {
            (CertificateStatus::Error, _) | (_, None) => Self {
                domain,
                status: CertificateStatus::Error.to_string(),
                days_left: "N/A".to_string(),
                expiry_date: "N/A".to_string(),
                issuer: "N/A".to_string(),
            },
            (status, Some(days)) => Self {
                domain,
                status: status.to_string(),
                days_left: days.to_string(),
                expiry_date: snapshot.expiry_date().unwrap_or_else(|| "N/A".to_string()),
                issuer: truncate(snapshot.issuer_or_unknown(), CELL_WIDTH),
            },
        }
    }

    pub fn cells(&self) -> [&str; 5] {
        [
            &self.domain,
            &self.status,
            &self.days_left,
            &self.expiry_date,
            &self.issuer,
        ]
    }
}

/// Build rows and summary in one pass for renderers
pub fn tabulate(
    snapshots: &[CertificateSnapshot],
    alert_window_days: i64,
) -> (Vec<ReportRow>, ReportSummary) {
    let rows = snapshots.iter().map(ReportRow::from_snapshot).collect();
    (rows, ReportSummary::from_snapshots(snapshots, alert_window_days))
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let head: String = value.chars().take(width).collect();
    format!("{}...", head)
}
