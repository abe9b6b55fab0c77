use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use tracing::{error, info};

use crate::api::{alerts, certificates, domains, emails};
use crate::monitor::Monitor;

/// Create the API server router with all routes
pub fn create_api_server(bind_addr: &str, monitor: Monitor) -> Result<(SocketAddr, Router)> {
    let addr: SocketAddr = bind_addr.parse()?;

    let app = Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/dashboard", get(certificates::dashboard))
        .route("/api/v1/domains", get(domains::list_domains).post(domains::add_domain))
        .route("/api/v1/domains/:domain", delete(domains::delete_domain))
        .route("/api/v1/check", post(certificates::check_now))
        .route("/api/v1/report", get(certificates::export_report))
        .route("/api/v1/emails", get(emails::list_emails).post(emails::add_email))
        .route("/api/v1/emails/:email", delete(emails::delete_email))
        .route("/api/v1/alerts/test", post(alerts::send_test_alert))
        .route("/api/v1/metrics", get(metrics_handler))
        .with_state(monitor)
        .layer(tower_http::cors::CorsLayer::permissive());

    info!("API server configured to bind on {}", addr);

    Ok((addr, app))
}

/// Run the API server until the listener fails
pub async fn run_api_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Prometheus metrics endpoint
async fn metrics_handler(State(monitor): State<Monitor>) -> Response {
    match monitor.metrics().export_metrics() {
        Ok(text) => text.into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
