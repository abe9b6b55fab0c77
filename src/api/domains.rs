use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::monitor::Monitor;
use crate::tls::CertificateSnapshot;

/// Request payload for adding a domain
#[derive(Debug, Deserialize, Serialize)]
pub struct DomainRequest {
    pub domain: String,
}

/// Response payload for additions
#[derive(Debug, Serialize)]
pub struct DomainsResponse {
    pub success: bool,
    pub added: bool,
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateSnapshot>,
}

/// Response payload for removals
#[derive(Debug, Serialize)]
pub struct RegistryResponse {
    pub success: bool,
    pub domains: Vec<String>,
}

/// GET /api/v1/domains - List monitored domains in registry order
pub async fn list_domains(State(monitor): State<Monitor>) -> Json<Vec<String>> {
    let domains = monitor.list_domains().await;
    info!("Listed {} domains", domains.len());
    Json(domains)
}

/// POST /api/v1/domains - Add a domain, inspect it, alert if due
pub async fn add_domain(
    State(monitor): State<Monitor>,
    Json(req): Json<DomainRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let domain = req.domain.trim();
    if domain.is_empty() {
        info!("Rejected empty domain");
        return Err(StatusCode::BAD_REQUEST);
    }

    let outcome = monitor.add_domain(domain).await;
    let status = if outcome.added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(DomainsResponse {
            success: true,
            added: outcome.added,
            domains: outcome.domains,
            certificate: outcome.certificate,
        }),
    ))
}

/// DELETE /api/v1/domains/:domain - Stop monitoring a domain
pub async fn delete_domain(
    State(monitor): State<Monitor>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let outcome = monitor.remove_domain(&domain).await;
    if !outcome.removed {
        info!("Failed to delete domain {}: not found", domain);
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(RegistryResponse {
        success: true,
        domains: outcome.domains,
    }))
}
