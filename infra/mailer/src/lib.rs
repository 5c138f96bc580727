//! # Mailer
//!
//! Sends the RSVP acknowledgement and itinerary emails.
//!
//! * [`SmtpMailer`] relays through an authenticated SMTP server (STARTTLS). The password is
//!   supplied per call because it lives in the registry record, not in static config.
//! * [`LogMailer`] writes envelopes to the log; the default for local runs.
//! * `RecordingMailer` (feature `testing`) keeps sent envelopes in memory and can be told to
//!   fail.
//!
//! [`MailTransport`] picks one of the first two at startup without boxing.

mod error;
mod smtp;
#[cfg(feature = "testing")]
mod testing;

pub use error::{MailError, MailErrorExt};
pub use smtp::SmtpMailer;
#[cfg(feature = "testing")]
pub use testing::RecordingMailer;

use std::future::Future;
use tracing::info;

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender_name: String,
    pub sender_email: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Envelope {
    /// `Name <address>` form used in the `From` header.
    #[must_use]
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender_email)
    }
}

/// Delivers an [`Envelope`].
pub trait Mailer: Send + Sync {
    /// Sends `envelope`, authenticating with `api_key` where the transport needs it.
    ///
    /// # Errors
    /// Returns [`MailError`] if the message cannot be built or the relay refuses it.
    fn send(
        &self,
        envelope: &Envelope,
        api_key: &str,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Logs envelopes instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, envelope: &Envelope, _api_key: &str) -> Result<(), MailError> {
        info!(
            from = %envelope.from_header(),
            to = %envelope.to,
            subject = %envelope.subject,
            body = %envelope.body,
            "Mail delivery skipped (log transport)"
        );
        Ok(())
    }
}

/// Transport chosen from configuration at startup.
#[derive(Debug, Clone)]
pub enum MailTransport {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer for MailTransport {
    async fn send(&self, envelope: &Envelope, api_key: &str) -> Result<(), MailError> {
        match self {
            Self::Smtp(mailer) => mailer.send(envelope, api_key).await,
            Self::Log(mailer) => mailer.send(envelope, api_key).await,
        }
    }
}

impl From<SmtpMailer> for MailTransport {
    fn from(mailer: SmtpMailer) -> Self {
        Self::Smtp(mailer)
    }
}

impl From<LogMailer> for MailTransport {
    fn from(mailer: LogMailer) -> Self {
        Self::Log(mailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> Envelope {
        Envelope {
            sender_name: "Di and Siyu Wedding".into(),
            sender_email: "us@example.com".into(),
            to: "ann@example.com".into(),
            subject: "You've Successfully RSVP-ed".into(),
            body: "Thank you".into(),
        }
    }

    #[test]
    fn from_header_combines_name_and_address() {
        assert_eq!(envelope().from_header(), "Di and Siyu Wedding <us@example.com>");
    }

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let transport = MailTransport::from(LogMailer);
        transport.send(&envelope(), "").await.unwrap();
    }
}
