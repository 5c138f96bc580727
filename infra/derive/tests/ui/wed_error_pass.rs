use std::borrow::Cow;

use wed_derive::wed_error;

#[wed_error]
pub enum DemoError {
    #[rejection]
    #[error("Missing Email")]
    MissingEmail,

    #[rejection]
    #[error("{email} has already RSVP-ed")]
    Duplicate { email: String },

    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Store unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    assert!(DemoError::MissingEmail.is_rejection());
    assert!(!DemoError::Unavailable { message: "boom".into(), context: None }.is_rejection());
}
