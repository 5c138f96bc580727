use std::borrow::Cow;

/// Errors returned by a [`crate::Mailer`]. Delivery is never retried by the mailer itself.
#[wed_derive::wed_error]
pub enum MailError {
    #[error("Invalid mail address{}: {source}", format_context(.context))]
    Address { source: lettre::address::AddressError, context: Option<Cow<'static, str>> },

    #[error("Failed to build message{}: {source}", format_context(.context))]
    Message { source: lettre::error::Error, context: Option<Cow<'static, str>> },

    /// Relay connection, authentication or delivery failure.
    #[error("SMTP error{}: {source}", format_context(.context))]
    Smtp { source: lettre::transport::smtp::Error, context: Option<Cow<'static, str>> },

    #[error("Mail rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
