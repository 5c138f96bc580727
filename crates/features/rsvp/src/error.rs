use crate::form::FormError;
use std::borrow::Cow;
use wed_kernel::store::StoreError;

/// Shown to the caller for every failure that is not a rejection.
pub const INFRA_FAILURE_MESSAGE: &str = "Oops, something went wrong.";

/// Why a submission was not accepted.
///
/// Rejections carry the text shown to the respondent; everything else is logged in full and
/// reported as [`INFRA_FAILURE_MESSAGE`].
#[wed_derive::wed_error]
pub enum RsvpError {
    #[rejection]
    #[error("Sorry! RSVP not open yet.")]
    Closed,

    #[rejection]
    #[error("Missing RSVP code")]
    MissingCode,

    #[rejection]
    #[error("Wrong code, please double check code in your RSVP email.")]
    WrongCode,

    #[rejection]
    #[error("Code has expired.")]
    ExpiredCode,

    #[rejection]
    #[error("{source}")]
    Invalid { source: FormError, context: Option<Cow<'static, str>> },

    #[rejection]
    #[error("Malformed submission: {message}")]
    Malformed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[rejection]
    #[error("{email} has already RSVP-ed")]
    Duplicate { email: String },

    #[error("Registry record is missing")]
    RegistryMissing,

    #[error("Store error{}: {source}", format_context(.context))]
    Store {
        #[source]
        source: StoreError,
        context: Option<Cow<'static, str>>,
    },
}

impl RsvpError {
    /// The message the respondent sees.
    #[must_use]
    pub fn public_message(&self) -> Cow<'static, str> {
        if self.is_rejection() { self.to_string().into() } else { INFRA_FAILURE_MESSAGE.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_failures_are_masked() {
        let err = RsvpError::Store {
            source: StoreError::Unavailable { message: "connection reset".into(), context: None },
            context: Some("Inserting rsvp".into()),
        };
        assert!(!err.is_rejection());
        assert_eq!(err.public_message(), INFRA_FAILURE_MESSAGE);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn rejections_are_shown_verbatim() {
        let err = RsvpError::Duplicate { email: "a@x.com".into() };
        assert_eq!(err.public_message(), "a@x.com has already RSVP-ed");

        let err = RsvpError::from(FormError::MissingField { field: "Email" });
        assert_eq!(err.public_message(), "Missing Email");
        assert_eq!(RsvpError::RegistryMissing.public_message(), INFRA_FAILURE_MESSAGE);
    }
}
