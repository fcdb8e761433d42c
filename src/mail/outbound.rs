//! Outbound mail — SMTP submission with STARTTLS via lettre.

use lettre::message::{header, Mailbox as LettreMailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::MailConfig;
use crate::error::MailError;

/// Outbound reply delivery seam.
pub trait ReplySender: Send + Sync {
    /// Send a reply with plain-text and HTML alternatives.
    fn send_reply(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), MailError>;
}

/// SMTP sender, one transport reused for the process lifetime.
pub struct MailSender {
    transport: SmtpTransport,
    from: LettreMailbox,
}

impl MailSender {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.address.clone(), config.password().to_string());

        let transport = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Connect {
                host: config.smtp_host.clone(),
                port: config.smtp_port,
                reason: e.to_string(),
            })?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        let from = format!("Mailmind <{}>", config.address)
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                address: config.address.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { transport, from })
    }
}

impl ReplySender for MailSender {
    fn send_reply(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        let to_mailbox: LettreMailbox =
            to.parse()
                .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                    address: to.to_string(),
                    reason: e.to_string(),
                })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(&email).map_err(|e| MailError::Send {
            to: to.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(to, subject, "Reply sent");
        Ok(())
    }
}

/// Subject for an outgoing reply: prefix `Re:` unless already present.
pub fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed
        .get(..3)
        .is_some_and(|p| p.eq_ignore_ascii_case("re:"))
    {
        trimmed.to_string()
    } else {
        format!("Re: {trimmed}")
    }
}
