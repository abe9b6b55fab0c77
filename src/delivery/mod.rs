// Alert delivery: message formatting, transports, and the recipient list

pub mod email;
pub mod recipients;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::error::DeliveryError;
use crate::tls::CertificateSnapshot;

pub use email::EmailDelivery;
pub use recipients::RecipientStore;

/// Transmits one expiry alert to every recipient
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(
        &self,
        recipients: &[String],
        snapshot: &CertificateSnapshot,
        attachment: Option<&[u8]>,
    ) -> Result<(), DeliveryError>;

    fn channel_name(&self) -> &str;
}

/// Rendered alert content, independent of transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub attachment_name: String,
}

impl AlertMessage {
    pub fn for_snapshot(snapshot: &CertificateSnapshot) -> Self {
        let days = snapshot
            .days_until_expiry
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        let expiry = snapshot.expiry_date().unwrap_or_else(|| "N/A".to_string());
        let issuer = snapshot.issuer_or_unknown();
        let checked_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let domain = &snapshot.domain;

        let subject = format!("SSL Alert: {} expires in {} days!", domain, days);

        let text_body = format!(
            "SSL Certificate Expiry Alert\n\n\
            {domain} will expire soon!\n\n\
            Domain: {domain}\n\
            Days until expiry: {days}\n\
            Expiry date: {expiry}\n\
            Issuer: {issuer}\n\
            Checked at: {checked_at}\n\n\
            ---\nThis is an automated message from SSL Watcher"
        );

        let html_body = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .alert {{ background: #fff3cd; border: 1px solid #ffeaa7; padding: 15px; border-radius: 5px; }}
        .info {{ margin: 10px 0; }}
        .domain {{ font-size: 18px; font-weight: bold; color: #d63031; }}
    </style>
</head>
<body>
    <div class="alert">
        <h2>SSL Certificate Expiry Alert</h2>
        <div class="info"><span class="domain">{domain}</span> will expire soon!</div>
    </div>
    <div class="info"><strong>Domain:</strong> {domain}</div>
    <div class="info"><strong>Days until expiry:</strong> {days}</div>
    <div class="info"><strong>Expiry date:</strong> {expiry}</div>
    <div class="info"><strong>Issuer:</strong> {issuer}</div>
    <div class="info"><strong>Checked at:</strong> {checked_at}</div>
    <br>
    <div><em>This is an automated message from SSL Watcher</em></div>
</body>
</html>"#,
            domain = escape_html(domain),
            issuer = escape_html(issuer),
        );

        Self {
            subject,
            text_body,
            html_body,
            attachment_name: format!("ssl_report_{}.pdf", snapshot.host),
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Used when no SMTP server is configured: alerts go to the log only
#[derive(Debug, Clone, Default)]
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn send(
        &self,
        recipients: &[String],
        snapshot: &CertificateSnapshot,
        attachment: Option<&[u8]>,
    ) -> Result<(), DeliveryError> {
        let message = AlertMessage::for_snapshot(snapshot);
        info!(
            recipients = recipients.len(),
            attachment_bytes = attachment.map(<[u8]>::len).unwrap_or(0),
            "SMTP not configured, alert not sent: {}",
            message.subject
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
