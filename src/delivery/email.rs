// Email alert transport using lettre

use async_trait::async_trait;
use lettre::message::{header, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use super::{AlertMessage, Delivery};
use crate::config::SmtpConfig;
use crate::error::DeliveryError;
use crate::tls::CertificateSnapshot;

pub struct EmailDelivery {
    config: SmtpConfig,
}

impl EmailDelivery {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
        address
            .parse()
            .map_err(|source| DeliveryError::InvalidAddress {
                address: address.to_string(),
                source,
            })
    }

    /// Build a multipart message: text and HTML alternatives, plus the report
    pub fn build_message(
        &self,
        recipients: &[String],
        snapshot: &CertificateSnapshot,
        attachment: Option<&[u8]>,
    ) -> Result<Message, DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let alert = AlertMessage::for_snapshot(snapshot);

        let mut builder = Message::builder()
            .from(Self::parse_mailbox(&self.config.from_address)?)
            .subject(alert.subject);
        for recipient in recipients {
            builder = builder.to(Self::parse_mailbox(recipient)?);
        }

        let body = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_PLAIN)
                    .body(alert.text_body),
            )
            .singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(alert.html_body),
            );

        let message = match attachment {
            Some(bytes) => {
                let content_type = header::ContentType::parse("application/pdf")?;
                let part = Attachment::new(alert.attachment_name).body(bytes.to_vec(), content_type);
                builder.multipart(MultiPart::mixed().multipart(body).singlepart(part))?
            }
            None => builder.multipart(body)?,
        };

        Ok(message)
    }

    fn transport(&self) -> Result<SmtpTransport, DeliveryError> {
        let builder = if self.config.starttls {
            SmtpTransport::starttls_relay(&self.config.server)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.server)
        };

        let builder = builder.port(self.config.port);
        let builder = if self.config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
        };

        Ok(builder.build())
    }
}

#[async_trait]
impl Delivery for EmailDelivery {
    async fn send(
        &self,
        recipients: &[String],
        snapshot: &CertificateSnapshot,
        attachment: Option<&[u8]>,
    ) -> Result<(), DeliveryError> {
        let message = self.build_message(recipients, snapshot, attachment)?;
        let transport = self.transport()?;

        // lettre's SMTP transport is blocking
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        info!(
            "Email sent to {} recipients for {}",
            recipients.len(),
            snapshot.domain
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
