use std::fmt::Write;
use wed_domain::rsvp::{Guest, RsvpSubmission};

pub const ITINERARY_SUBJECT: &str = "Your Wedding Itinerary";

/// Plain-text itinerary for one party: every attendee with type and meal, then the
/// respondent's hotel answer and notes.
#[must_use]
pub fn compose(rsvp: &RsvpSubmission, party: &[&Guest]) -> String {
    let mut body = format!(
        "Dear {},\n\nThank you for your RSVP. Here is what we have on file for your party:\n\n",
        rsvp.first_name
    );

    for guest in party {
        let kind = if guest.is_child { "Child" } else { "Adult" };
        let meal = if guest.meal_option.is_empty() { "no meal selected" } else { &guest.meal_option };
        // Writing into a String cannot fail.
        let _ = writeln!(body, "  - {} ({kind}): {meal}", guest.full_name());
    }

    let hotel = if rsvp.staying_at_hotel { "yes" } else { "no" };
    let _ = write!(body, "\nStaying at the hotel: {hotel}\n");
    if !rsvp.extra_notes.is_empty() {
        let _ = writeln!(body, "Notes: {}", rsvp.extra_notes);
    }
    body.push_str("\nIf anything looks wrong, just reply to this email. See you at the wedding!\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(first: &str, is_child: bool, meal: &str) -> Guest {
        Guest {
            first_name: first.into(),
            last_name: "Lee".into(),
            is_child,
            meal_option: meal.into(),
            guest_of: String::new(),
        }
    }

    #[test]
    fn lists_every_guest_with_type_and_meal() {
        let rsvp = RsvpSubmission {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            staying_at_hotel: true,
            extra_notes: "arriving late".into(),
            ..RsvpSubmission::default()
        };
        let ann = guest("Ann", false, "fish");
        let cy = guest("Cy", true, "");

        let body = compose(&rsvp, &[&ann, &cy]);
        assert!(body.starts_with("Dear Ann,"));
        assert!(body.contains("  - Ann Lee (Adult): fish\n"));
        assert!(body.contains("  - Cy Lee (Child): no meal selected\n"));
        assert!(body.contains("Staying at the hotel: yes"));
        assert!(body.contains("Notes: arriving late"));
    }

    #[test]
    fn notes_line_is_omitted_when_empty() {
        let body = compose(&RsvpSubmission::default(), &[]);
        assert!(!body.contains("Notes:"));
        assert!(body.contains("Staying at the hotel: no"));
    }
}
