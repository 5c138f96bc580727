use std::borrow::Cow;

use wed_derive::wed_error;

#[wed_error]
pub enum SubmitError {
    #[rejection]
    #[error("Code has expired.")]
    ExpiredCode,

    #[rejection]
    #[error("{email} has already RSVP-ed")]
    AlreadySubmitted { email: String },

    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Store unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn io_failure() -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk full"))
}

#[test]
fn wed_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/wed_error_pass.rs");
}

#[test]
fn rejection_variants_are_classified() {
    assert!(SubmitError::ExpiredCode.is_rejection());
    assert!(SubmitError::AlreadySubmitted { email: "a@b.c".into() }.is_rejection());
    assert!(!SubmitError::Unavailable { message: "store offline".into(), context: None }.is_rejection());
}

#[test]
fn rejection_messages_render_verbatim() {
    let err = SubmitError::AlreadySubmitted { email: "guest@example.com".into() };
    assert_eq!(err.to_string(), "guest@example.com has already RSVP-ed");
    assert_eq!(SubmitError::ExpiredCode.to_string(), "Code has expired.");
}

#[test]
fn context_is_attached_to_source_errors() {
    let err = io_failure().context("writing rsvp").unwrap_err();
    assert!(matches!(err, SubmitError::Io { .. }));
    assert_eq!(err.to_string(), "IO error (writing rsvp): disk full");
}

#[test]
fn context_is_attached_to_own_results() {
    let res: Result<(), SubmitError> = Err(SubmitError::Unavailable { message: "boom".into(), context: None });
    let err = res.context("sweep").unwrap_err();
    assert_eq!(err.to_string(), "Store unavailable (sweep): boom");
}

#[test]
fn context_is_ignored_on_unit_variants() {
    let res: Result<(), SubmitError> = Err(SubmitError::ExpiredCode);
    let err = res.context("ignored").unwrap_err();
    assert_eq!(err.to_string(), "Code has expired.");
}
