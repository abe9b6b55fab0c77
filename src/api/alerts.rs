use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{error, info};

use crate::monitor::Monitor;

/// POST /api/v1/alerts/test - Send a sample alert to every recipient
pub async fn send_test_alert(State(monitor): State<Monitor>) -> Response {
    match monitor.send_test_alert().await {
        Ok(count) => {
            info!("Test alert sent to {} recipients", count);
            Json(json!({
                "success": true,
                "message": format!("Test alert sent to {} recipients", count),
            }))
            .into_response()
        }
        Err(e) => {
            error!("Test alert failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
