//! RSVP form input and its validation.
//!
//! Submissions arrive either as the legacy flat form (`guestAdultFirstName0`, ...) or as
//! structured JSON. Both are turned into an [`RsvpForm`] first; [`parse_rsvp`] only ever sees
//! that shape.

use crate::dto::{GuestEntry, RsvpRequest};
use fxhash::FxHashMap;
use wed_domain::rsvp::{Guest, MAX_ADULT_GUESTS, MAX_CHILD_GUESTS, RsvpSubmission};

const FIRST_NAME: &str = "First Name";
const LAST_NAME: &str = "Last Name";
const EMAIL: &str = "Email";

#[wed_derive::wed_error]
pub enum FormError {
    #[rejection]
    #[error("Missing {field}")]
    MissingField { field: &'static str },

    #[rejection]
    #[error("Invalid {kind} Guest Count")]
    InvalidCount { kind: &'static str },
}

/// One submission before validation.
///
/// Counts are kept as sent; the guest vectors may be shorter or longer than them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsvpForm {
    pub rsvp_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub staying_at_hotel: bool,
    pub adult_count: i64,
    pub child_count: i64,
    pub entree: String,
    pub adult_guests: Vec<GuestEntry>,
    pub child_guests: Vec<GuestEntry>,
    pub extra_notes: String,
}

/// A validated submission with the attendees derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRsvp {
    pub submission: RsvpSubmission,
    /// The respondent first, then adults, then children.
    pub guests: Vec<Guest>,
}

impl RsvpForm {
    /// Demultiplexes flat `key=value` pairs. The first occurrence of a key wins.
    ///
    /// Unparsable booleans and counts read as `false` / `0`. Guest entries are read for
    /// `min(count, max)` indices per kind; an out-of-range count is left for [`parse_rsvp`]
    /// to reject.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut fields: FxHashMap<&str, &str> = FxHashMap::default();
        for (key, value) in pairs {
            fields.entry(key).or_insert(value);
        }
        let get = |key: &str| fields.get(key).copied().unwrap_or_default().to_owned();

        let adult_count = parse_count(&get("adultCount"));
        let child_count = parse_count(&get("childCount"));

        let entries = |kind: &str, count: i64, max: i64| -> Vec<GuestEntry> {
            (0..count.clamp(0, max))
                .map(|i| GuestEntry {
                    first_name: get(&format!("guest{kind}FirstName{i}")),
                    last_name: get(&format!("guest{kind}LastName{i}")),
                    entree: get(&format!("guest{kind}Entree{i}")),
                })
                .collect()
        };

        Self {
            rsvp_code: get("rsvpCode"),
            first_name: get("firstName"),
            last_name: get("lastName"),
            email: get("email"),
            staying_at_hotel: parse_bool(&get("hotel")),
            adult_count,
            child_count,
            entree: get("entree"),
            adult_guests: entries("Adult", adult_count, MAX_ADULT_GUESTS),
            child_guests: entries("Child", child_count, MAX_CHILD_GUESTS),
            extra_notes: get("extraNotes"),
        }
    }
}

impl From<RsvpRequest> for RsvpForm {
    fn from(request: RsvpRequest) -> Self {
        Self {
            rsvp_code: request.rsvp_code,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            staying_at_hotel: request.hotel,
            adult_count: len_as_count(&request.adult_guests),
            child_count: len_as_count(&request.child_guests),
            entree: request.entree,
            adult_guests: request.adult_guests,
            child_guests: request.child_guests,
            extra_notes: request.extra_notes,
        }
    }
}

fn len_as_count(entries: &[GuestEntry]) -> i64 {
    i64::try_from(entries.len()).unwrap_or(i64::MAX)
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`; anything else is `false`.
fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "t" | "T" | "TRUE" | "true" | "True")
}

fn parse_count(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() { Err(FormError::MissingField { field }) } else { Ok(value.to_owned()) }
}

fn in_range(count: i64, max: i64, kind: &'static str) -> Result<i64, FormError> {
    if (0..=max).contains(&count) { Ok(count) } else { Err(FormError::InvalidCount { kind }) }
}

/// Validates `form` and derives the attendee list.
///
/// Checks run in order and the first failure is returned: first name, last name, email,
/// adult count, child count, then each attendee's first name.
///
/// # Errors
/// [`FormError::MissingField`] or [`FormError::InvalidCount`].
pub fn parse_rsvp(form: &RsvpForm) -> Result<ParsedRsvp, FormError> {
    let first_name = required(&form.first_name, FIRST_NAME)?;
    let last_name = required(&form.last_name, LAST_NAME)?;
    let email = required(&form.email, EMAIL)?.to_lowercase();
    let adult_count = in_range(form.adult_count, MAX_ADULT_GUESTS, "Adult")?;
    let child_count = in_range(form.child_count, MAX_CHILD_GUESTS, "Child")?;

    let submission = RsvpSubmission {
        first_name,
        last_name,
        email,
        staying_at_hotel: form.staying_at_hotel,
        adult_guest_count: adult_count,
        child_guest_count: child_count,
        extra_notes: form.extra_notes.trim().to_owned(),
        confirmation_sent: false,
    };

    let guest_of = submission.full_name();
    let mut guests = Vec::with_capacity(1 + form.adult_guests.len() + form.child_guests.len());
    guests.push(Guest {
        first_name: submission.first_name.clone(),
        last_name: submission.last_name.clone(),
        is_child: false,
        meal_option: form.entree.trim().to_owned(),
        guest_of: String::new(),
    });

    for (entries, count, is_child) in
        [(&form.adult_guests, adult_count, false), (&form.child_guests, child_count, true)]
    {
        for i in 0..usize::try_from(count).unwrap_or_default() {
            let entry = entries.get(i).cloned().unwrap_or_default();
            guests.push(Guest {
                first_name: entry.first_name.trim().to_owned(),
                last_name: entry.last_name.trim().to_owned(),
                is_child,
                meal_option: entry.entree.trim().to_owned(),
                guest_of: guest_of.clone(),
            });
        }
    }

    if guests.iter().any(|guest| guest.first_name.is_empty()) {
        return Err(FormError::MissingField { field: FIRST_NAME });
    }

    Ok(ParsedRsvp { submission, guests })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flat(pairs: &[(&str, &str)]) -> RsvpForm {
        RsvpForm::from_pairs(pairs.iter().copied())
    }

    fn ann_and_bob() -> RsvpForm {
        flat(&[
            ("firstName", "Ann"),
            ("lastName", "Lee"),
            ("email", "a@x.com"),
            ("hotel", "true"),
            ("adultCount", "1"),
            ("childCount", "0"),
            ("entree", "fish"),
            ("guestAdultFirstName0", "Bob"),
            ("guestAdultLastName0", "Lee"),
            ("guestAdultEntree0", "beef"),
        ])
    }

    #[test]
    fn worked_example_builds_two_guests() {
        let parsed = parse_rsvp(&ann_and_bob()).unwrap();

        assert!(parsed.submission.staying_at_hotel);
        assert_eq!(parsed.submission.adult_guest_count, 1);
        assert_eq!(parsed.guests.len(), 2);
        assert_eq!(parsed.guests[0].full_name(), "Ann Lee");
        assert_eq!(parsed.guests[0].meal_option, "fish");
        assert_eq!(parsed.guests[0].guest_of, "");
        assert_eq!(parsed.guests[1].full_name(), "Bob Lee");
        assert_eq!(parsed.guests[1].meal_option, "beef");
        assert_eq!(parsed.guests[1].guest_of, "Ann Lee");
        assert!(!parsed.guests[1].is_child);
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let err = parse_rsvp(&flat(&[("adultCount", "7")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing First Name");

        let err = parse_rsvp(&flat(&[("firstName", "Ann"), ("email", "a@x.com")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing Last Name");

        let err = parse_rsvp(&flat(&[("firstName", "Ann"), ("lastName", "Lee")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing Email");
        assert!(err.is_rejection());
    }

    #[test]
    fn counts_out_of_range_are_rejected() {
        let mut form = ann_and_bob();
        form.adult_count = 2;
        assert_eq!(parse_rsvp(&form).unwrap_err().to_string(), "Invalid Adult Guest Count");

        let mut form = ann_and_bob();
        form.child_count = -1;
        assert_eq!(parse_rsvp(&form).unwrap_err().to_string(), "Invalid Child Guest Count");
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let form = flat(&[
            ("firstName", "Ann"),
            ("lastName", "Lee"),
            ("email", "a@x.com"),
            ("hotel", "yes"),
            ("adultCount", "one"),
            ("childCount", ""),
        ]);
        assert!(!form.staying_at_hotel);
        assert_eq!((form.adult_count, form.child_count), (0, 0));
        assert_eq!(parse_rsvp(&form).unwrap().guests.len(), 1);
    }

    #[test]
    fn boolean_spellings() {
        for value in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(parse_bool(value), "{value}");
        }
        for value in ["0", "f", "F", "FALSE", "false", "False", "on", "tRuE"] {
            assert!(!parse_bool(value), "{value}");
        }
    }

    #[test]
    fn guest_without_first_name_is_rejected() {
        let form = flat(&[
            ("firstName", "Ann"),
            ("lastName", "Lee"),
            ("email", "a@x.com"),
            ("childCount", "2"),
            ("guestChildFirstName0", "Cy"),
        ]);
        assert_eq!(form.child_guests.len(), 2);
        assert_eq!(parse_rsvp(&form).unwrap_err().to_string(), "Missing First Name");
    }

    #[test]
    fn first_value_of_a_repeated_key_wins() {
        let form = flat(&[("firstName", "Ann"), ("firstName", "Zed")]);
        assert_eq!(form.first_name, "Ann");
    }

    #[test]
    fn text_is_trimmed_and_email_lowercased() {
        let mut form = ann_and_bob();
        form.first_name = "  Ann ".into();
        form.email = " Ann@Example.COM ".into();
        form.extra_notes = " late arrival\n".into();

        let parsed = parse_rsvp(&form).unwrap();
        assert_eq!(parsed.submission.first_name, "Ann");
        assert_eq!(parsed.submission.email, "ann@example.com");
        assert_eq!(parsed.submission.extra_notes, "late arrival");
        assert_eq!(parsed.guests[1].guest_of, "Ann Lee");

        form.last_name = "   ".into();
        assert_eq!(parse_rsvp(&form).unwrap_err().to_string(), "Missing Last Name");
    }

    #[test]
    fn json_and_flat_shapes_agree() {
        let request = RsvpRequest {
            rsvp_code: String::new(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "a@x.com".into(),
            hotel: true,
            entree: "fish".into(),
            adult_guests: vec![GuestEntry {
                first_name: "Bob".into(),
                last_name: "Lee".into(),
                entree: "beef".into(),
            }],
            child_guests: Vec::new(),
            extra_notes: String::new(),
        };

        assert_eq!(RsvpForm::from(request), ann_and_bob());
    }

    #[test]
    fn oversized_json_guest_list_is_a_count_error() {
        let request = RsvpRequest {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "a@x.com".into(),
            adult_guests: vec![GuestEntry::default(), GuestEntry::default()],
            ..RsvpRequest::default()
        };
        let err = parse_rsvp(&RsvpForm::from(request)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid Adult Guest Count");
    }

    fn named_entry() -> impl Strategy<Value = GuestEntry> {
        ("[A-Za-z]{1,8}", "[A-Za-z]{0,8}", "[a-z]{0,6}").prop_map(|(first, last, entree)| {
            GuestEntry { first_name: first, last_name: last, entree }
        })
    }

    proptest! {
        #[test]
        fn guest_list_has_respondent_plus_party(
            adults in prop::collection::vec(named_entry(), 0..=1),
            children in prop::collection::vec(named_entry(), 0..=2),
        ) {
            let form = RsvpForm {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                email: "a@x.com".into(),
                adult_count: len_as_count(&adults),
                child_count: len_as_count(&children),
                adult_guests: adults.clone(),
                child_guests: children.clone(),
                ..RsvpForm::default()
            };

            let parsed = parse_rsvp(&form).unwrap();
            prop_assert_eq!(parsed.guests.len(), 1 + adults.len() + children.len());
            prop_assert_eq!(parsed.guests[0].full_name(), "Ann Lee");
            prop_assert!(parsed.guests[1..].iter().all(|g| g.guest_of == "Ann Lee"));
            prop_assert_eq!(
                parsed.guests.iter().filter(|g| g.is_child).count(),
                children.len()
            );
        }

        #[test]
        fn blank_first_name_is_always_the_first_error(
            blank in "[ \t]{0,3}",
            adult_count in -3i64..5,
            child_count in -3i64..5,
        ) {
            let form = RsvpForm {
                first_name: blank,
                adult_count,
                child_count,
                ..RsvpForm::default()
            };
            let err = parse_rsvp(&form).unwrap_err();
            prop_assert_eq!(err.to_string(), "Missing First Name");
        }
    }
}
