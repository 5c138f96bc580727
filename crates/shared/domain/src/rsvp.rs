//! RSVP records, invitation codes and the registry switch.

use crate::constants::{PROD_GUEST_TABLE, PROD_RSVP_TABLE, TEST_GUEST_TABLE, TEST_RSVP_TABLE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on extra adult guests per RSVP.
pub const MAX_ADULT_GUESTS: i64 = 1;
/// Upper bound on extra child guests per RSVP.
pub const MAX_CHILD_GUESTS: i64 = 2;

/// Which set of RSVP/guest tables a request reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Test,
    Prod,
}

impl Environment {
    #[must_use]
    pub const fn rsvp_table(self) -> &'static str {
        match self {
            Self::Test => TEST_RSVP_TABLE,
            Self::Prod => PROD_RSVP_TABLE,
        }
    }

    #[must_use]
    pub const fn guest_table(self) -> &'static str {
        match self {
            Self::Test => TEST_GUEST_TABLE,
            Self::Prod => PROD_GUEST_TABLE,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }

    /// Parses the stored spelling; anything other than `prod` is the test namespace.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("prod") { Self::Prod } else { Self::Test }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The externally managed switch that opens RSVPs and carries the mail settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub enabled: bool,
    pub sender_email: String,
    pub environment: Environment,
    pub email_api_key: String,
}

/// A single-use-per-party code with a bounded number of uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationCode {
    pub code: String,
    pub remaining_quota: i64,
}

impl InvitationCode {
    #[must_use]
    pub fn new(code: impl Into<String>, remaining_quota: i64) -> Self {
        Self { code: code.into(), remaining_quota }
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining_quota <= 0
    }
}

/// One attendee: the respondent or a guest they bring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub first_name: String,
    pub last_name: String,
    pub is_child: bool,
    pub meal_option: String,
    /// Empty for the respondent, otherwise the respondent's full name.
    pub guest_of: String,
}

impl Guest {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// `true` if this guest is the respondent of `rsvp` or someone they bring.
    #[must_use]
    pub fn belongs_to(&self, rsvp: &RsvpSubmission) -> bool {
        let respondent = rsvp.full_name();
        self.full_name() == respondent || self.guest_of == respondent
    }
}

/// One party's answer, keyed by email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub staying_at_hotel: bool,
    pub adult_guest_count: i64,
    pub child_guest_count: i64,
    pub extra_notes: String,
    pub confirmation_sent: bool,
}

impl RsvpSubmission {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Number of attendees including the respondent.
    #[must_use]
    pub const fn party_size(&self) -> i64 {
        1 + self.adult_guest_count + self.child_guest_count
    }
}

/// A record together with the identity the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: String,
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: impl Into<String>, record: T) -> Self {
        Self { id: id.into(), record }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> RsvpSubmission {
        RsvpSubmission {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "a@x.com".into(),
            adult_guest_count: 1,
            ..RsvpSubmission::default()
        }
    }

    #[test]
    fn environment_selects_tables() {
        assert_eq!(Environment::Prod.rsvp_table(), "rsvp");
        assert_eq!(Environment::Prod.guest_table(), "guest");
        assert_eq!(Environment::Test.rsvp_table(), "test_rsvp");
        assert_eq!(Environment::Test.guest_table(), "test_guest");
    }

    #[test]
    fn unknown_environment_falls_back_to_test() {
        assert_eq!(Environment::from_stored("PROD"), Environment::Prod);
        assert_eq!(Environment::from_stored("staging"), Environment::Test);
    }

    #[test]
    fn guest_matches_by_own_name_or_guest_of() {
        let rsvp = ann();
        let respondent = Guest { first_name: "Ann".into(), last_name: "Lee".into(), ..Guest::default() };
        let plus_one = Guest {
            first_name: "Bob".into(),
            last_name: "Lee".into(),
            guest_of: "Ann Lee".into(),
            ..Guest::default()
        };
        let stranger = Guest { first_name: "Cid".into(), last_name: "Lee".into(), ..Guest::default() };

        assert!(respondent.belongs_to(&rsvp));
        assert!(plus_one.belongs_to(&rsvp));
        assert!(!stranger.belongs_to(&rsvp));
    }

    #[test]
    fn exhausted_codes() {
        assert!(InvitationCode::new("X", 0).is_exhausted());
        assert!(!InvitationCode::new("X", 1).is_exhausted());
        assert_eq!(ann().party_size(), 2);
    }
}
