//! Table names, record keys and fixed strings shared between the store, the features and the
//! schema migrations.

/// Table holding the single registry record.
pub const REGISTRY_TABLE: &str = "registry";
/// Key of the registry record (`registry:rsvp`).
pub const REGISTRY_KEY: &str = "rsvp";
/// Table holding invitation codes.
pub const CODE_TABLE: &str = "rsvp_code";

pub const PROD_RSVP_TABLE: &str = "rsvp";
pub const PROD_GUEST_TABLE: &str = "guest";
pub const TEST_RSVP_TABLE: &str = "test_rsvp";
pub const TEST_GUEST_TABLE: &str = "test_guest";

/// Display name used in the `From` header of outgoing mail.
pub const DEFAULT_SENDER_NAME: &str = "Di and Siyu Wedding";

// OpenAPI tags
pub const SYSTEM_TAG: &str = "system";
pub const RSVP_TAG: &str = "rsvp";
pub const CONFIRMATION_TAG: &str = "confirmation";
