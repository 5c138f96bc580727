use wed_derive::api_model;

/// Reply to every submission, whatever the outcome.
#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct RsvpResponse {
    pub success: bool,
    pub message: String,
}

impl RsvpResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// An extra adult or child brought by the respondent.
#[api_model(deny_unknown_fields = false)]
#[derive(Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GuestEntry {
    pub first_name: String,
    pub last_name: String,
    pub entree: String,
}

/// Structured JSON submission; guest counts follow from the array lengths.
#[api_model(deny_unknown_fields = false)]
#[derive(Clone, Default)]
#[serde(default)]
pub struct RsvpRequest {
    pub rsvp_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hotel: bool,
    pub entree: String,
    pub adult_guests: Vec<GuestEntry>,
    pub child_guests: Vec<GuestEntry>,
    pub extra_notes: String,
}
