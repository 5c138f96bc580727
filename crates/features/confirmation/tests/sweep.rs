use wed_confirmation::itinerary::ITINERARY_SUBJECT;
use wed_confirmation::{ConfirmationSweeper, SWEEP_DONE, SweepError, SweepSummary};
use wed_domain::rsvp::{Environment, Guest, RegistryConfig, RsvpSubmission};
use wed_kernel::store::{MemoryStore, RsvpStore, StoreOp};
use wed_mailer::RecordingMailer;

struct Fixture {
    store: MemoryStore,
    mailer: RecordingMailer,
    sweeper: ConfirmationSweeper<MemoryStore, RecordingMailer>,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    store
        .put_registry(&RegistryConfig {
            enabled: false,
            sender_email: "us@example.com".into(),
            environment: Environment::Prod,
            email_api_key: "key".into(),
        })
        .await
        .unwrap();

    let mailer = RecordingMailer::new();
    let sweeper = ConfirmationSweeper::new(store.clone(), mailer.clone(), "Di and Siyu Wedding");
    Fixture { store, mailer, sweeper }
}

async fn party(
    store: &MemoryStore,
    first: &str,
    email: &str,
    plus_one: Option<&str>,
    confirmed: bool,
) {
    let rsvp = RsvpSubmission {
        first_name: first.into(),
        last_name: "Lee".into(),
        email: email.into(),
        adult_guest_count: i64::from(plus_one.is_some()),
        confirmation_sent: confirmed,
        ..RsvpSubmission::default()
    };
    store.insert_rsvp(Environment::Prod, &rsvp).await.unwrap();
    store
        .insert_guest(
            Environment::Prod,
            &Guest {
                first_name: first.into(),
                last_name: "Lee".into(),
                meal_option: "fish".into(),
                ..Guest::default()
            },
        )
        .await
        .unwrap();

    if let Some(plus_one) = plus_one {
        store
            .insert_guest(
                Environment::Prod,
                &Guest {
                    first_name: plus_one.into(),
                    last_name: "Lee".into(),
                    is_child: true,
                    meal_option: "pasta".into(),
                    guest_of: rsvp.full_name(),
                },
            )
            .await
            .unwrap();
    }
}

async fn run(
    sweeper: &ConfirmationSweeper<MemoryStore, RecordingMailer>,
) -> (Vec<String>, Result<SweepSummary, SweepError>) {
    let mut lines = Vec::new();
    let result = sweeper.run(|line| lines.push(line)).await;
    (lines, result)
}

#[tokio::test]
async fn unconfirmed_parties_get_an_itinerary() {
    let fx = fixture().await;
    party(&fx.store, "Ann", "ann@x.com", Some("Cy"), false).await;
    party(&fx.store, "Dee", "dee@x.com", None, true).await;

    let (lines, result) = run(&fx.sweeper).await;
    assert_eq!(result.unwrap(), SweepSummary { confirmed: 1, failed: 0, unsaved: 0 });
    assert_eq!(lines, ["Ann Lee <ann@x.com>: itinerary sent (2 guests)", SWEEP_DONE]);

    let sent = fx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@x.com");
    assert_eq!(sent[0].subject, ITINERARY_SUBJECT);
    assert!(sent[0].body.contains("Ann Lee (Adult): fish"));
    assert!(sent[0].body.contains("Cy Lee (Child): pasta"));

    assert!(fx.store.stored_rsvps(Environment::Prod).iter().all(|r| r.record.confirmation_sent));

    let (lines, result) = run(&fx.sweeper).await;
    assert_eq!(result.unwrap(), SweepSummary::default());
    assert_eq!(lines, [SWEEP_DONE]);
    assert_eq!(fx.mailer.attempts(), 1);
}

#[tokio::test]
async fn failed_send_is_reported_and_the_sweep_continues() {
    let fx = fixture().await;
    party(&fx.store, "Ann", "ann@x.com", None, false).await;
    party(&fx.store, "Bea", "bea@x.com", None, false).await;
    fx.mailer.fail_for("ann@x.com");

    let (lines, result) = run(&fx.sweeper).await;
    assert_eq!(result.unwrap(), SweepSummary { confirmed: 1, failed: 1, unsaved: 0 });
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Ann Lee <ann@x.com>: failed to send itinerary"));
    assert_eq!(lines[1], "Bea Lee <bea@x.com>: itinerary sent (1 guests)");
    assert_eq!(lines[2], SWEEP_DONE);

    let rsvps = fx.store.stored_rsvps(Environment::Prod);
    let ann = rsvps.iter().find(|r| r.record.email == "ann@x.com").unwrap();
    let bea = rsvps.iter().find(|r| r.record.email == "bea@x.com").unwrap();
    assert!(!ann.record.confirmation_sent);
    assert!(bea.record.confirmation_sent);
}

#[tokio::test]
async fn failed_flag_write_does_not_stop_the_sweep() {
    let fx = fixture().await;
    party(&fx.store, "Ann", "ann@x.com", None, false).await;
    party(&fx.store, "Bea", "bea@x.com", None, false).await;
    fx.store.fail_after(StoreOp::SaveRsvp, 0);

    let (lines, result) = run(&fx.sweeper).await;
    assert_eq!(result.unwrap(), SweepSummary { confirmed: 0, failed: 0, unsaved: 2 });
    assert!(lines[0].contains("marking it confirmed failed"));
    assert_eq!(lines.last().map(String::as_str), Some(SWEEP_DONE));
    assert_eq!(fx.mailer.sent().len(), 2);
}

#[tokio::test]
async fn unreadable_guests_abort_with_an_error_line() {
    let fx = fixture().await;
    party(&fx.store, "Ann", "ann@x.com", None, false).await;
    fx.store.fail(StoreOp::Guests);

    let (lines, result) = run(&fx.sweeper).await;
    assert!(matches!(result, Err(SweepError::Store { .. })));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error: "));
    assert_eq!(fx.store.calls(StoreOp::Rsvps), 0);
    assert_eq!(fx.mailer.attempts(), 0);
}

#[tokio::test]
async fn missing_registry_aborts() {
    let store = MemoryStore::new();
    let sweeper = ConfirmationSweeper::new(store, RecordingMailer::new(), "x");

    let (lines, result) = run(&sweeper).await;
    assert!(matches!(result, Err(SweepError::RegistryMissing)));
    assert_eq!(lines, ["error: Registry record is missing"]);
}
