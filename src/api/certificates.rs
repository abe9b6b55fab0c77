use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::monitor::{Dashboard, Monitor};
use crate::tls::CertificateSnapshot;

/// Response after a manual check
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub results: Vec<CertificateSnapshot>,
    pub notified: Vec<String>,
}

/// GET /api/v1/dashboard - Current state of every certificate
pub async fn dashboard(State(monitor): State<Monitor>) -> Json<Dashboard> {
    Json(monitor.dashboard().await)
}

/// POST /api/v1/check - Inspect everything now, alerting through the ledger
pub async fn check_now(State(monitor): State<Monitor>) -> Json<CheckResponse> {
    let report = monitor.run_cycle().await;
    info!(
        "Manual check of {} domains sent {} alerts",
        report.snapshots.len(),
        report.notified.len()
    );
    Json(CheckResponse {
        success: true,
        results: report.snapshots,
        notified: report.notified,
    })
}

/// GET /api/v1/report - Download the summary report
pub async fn export_report(State(monitor): State<Monitor>) -> Response {
    match monitor.export_report().await {
        Ok(bytes) => {
            let filename = format!("ssl_report_{}.pdf", Utc::now().format("%Y%m%d_%H%M%S"));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, monitor.report_content_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("Report export failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate report" })),
            )
                .into_response()
        }
    }
}
