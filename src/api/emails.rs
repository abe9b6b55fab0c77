use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::monitor::Monitor;

#[derive(Debug, Deserialize, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct EmailsResponse {
    pub success: bool,
    pub emails: Vec<String>,
}

/// GET /api/v1/emails - List alert recipients
pub async fn list_emails(State(monitor): State<Monitor>) -> Result<Json<Vec<String>>, StatusCode> {
    monitor.recipients().load().map(Json).map_err(|e| {
        error!("Failed to load recipients: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// POST /api/v1/emails - Add an alert recipient
pub async fn add_email(
    State(monitor): State<Monitor>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<EmailsResponse>, StatusCode> {
    let emails = monitor.recipients().add(&req.email).map_err(|e| {
        error!("Failed to add recipient: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    info!("Recipient list now has {} addresses", emails.len());
    Ok(Json(EmailsResponse {
        success: true,
        emails,
    }))
}

/// DELETE /api/v1/emails/:email - Remove an alert recipient
pub async fn delete_email(
    State(monitor): State<Monitor>,
    Path(email): Path<String>,
) -> Result<Json<EmailsResponse>, StatusCode> {
    let emails = monitor.recipients().remove(&email).map_err(|e| {
        error!("Failed to remove recipient: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    info!("Recipient list now has {} addresses", emails.len());
    Ok(Json(EmailsResponse {
        success: true,
        emails,
    }))
}
