use crate::error::{MailError, MailErrorExt};
use crate::{Envelope, Mailer};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_PORT: u16 = 587;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// STARTTLS relay client. A transport is built per message since the password can change
/// between calls.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    timeout: Duration,
}

impl SmtpMailer {
    #[must_use]
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self { host: host.into(), port: DEFAULT_PORT, username: username.into(), timeout: DEFAULT_TIMEOUT }
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn transport(&self, api_key: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .context(format!("relay {}", self.host))?
            .port(self.port)
            .credentials(Credentials::new(self.username.clone(), api_key.to_owned()))
            .timeout(Some(self.timeout))
            .build();
        Ok(transport)
    }
}

/// Builds the plain-text message for `envelope`.
///
/// # Errors
/// Fails on unparsable addresses or an invalid message.
pub(crate) fn build_message(envelope: &Envelope) -> Result<Message, MailError> {
    let from: Mailbox = envelope.from_header().parse::<Mailbox>().context("sender")?;
    let to: Mailbox = envelope.to.parse::<Mailbox>().context("recipient")?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(envelope.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(envelope.body.clone())?;
    Ok(message)
}

impl Mailer for SmtpMailer {
    #[instrument(skip_all, fields(to = %envelope.to, host = %self.host))]
    async fn send(&self, envelope: &Envelope, api_key: &str) -> Result<(), MailError> {
        let message = build_message(envelope)?;
        let response = self.transport(api_key)?.send(message).await.context("delivery")?;
        debug!(code = %response.code(), "Relay accepted message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(to: &str) -> Envelope {
        Envelope {
            sender_name: "Di and Siyu Wedding".into(),
            sender_email: "us@example.com".into(),
            to: to.into(),
            subject: "Itinerary".into(),
            body: "See you there".into(),
        }
    }

    #[test]
    fn builds_message_with_display_name() {
        let message = build_message(&envelope("ann@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Di and Siyu Wedding"));
        assert!(raw.contains("<us@example.com>"));
        assert!(raw.contains("ann@example.com"));
        assert!(raw.contains("Subject: Itinerary"));
    }

    #[test]
    fn rejects_bad_recipient() {
        let err = build_message(&envelope("not an address")).unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }
}
