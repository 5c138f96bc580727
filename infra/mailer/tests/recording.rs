#![cfg(feature = "testing")]

use wed_mailer::{Envelope, MailError, Mailer, RecordingMailer};

fn envelope(to: &str) -> Envelope {
    Envelope {
        sender_name: "Di and Siyu Wedding".into(),
        sender_email: "us@example.com".into(),
        to: to.into(),
        subject: "Itinerary".into(),
        body: "Ann Lee, Adult, fish".into(),
    }
}

#[tokio::test]
async fn records_and_fails_selectively() {
    let mailer = RecordingMailer::new();
    mailer.fail_for("bad@example.com");

    mailer.send(&envelope("ann@example.com"), "key").await.unwrap();
    let err = mailer.send(&envelope("bad@example.com"), "key").await.unwrap_err();
    assert!(matches!(err, MailError::Rejected { .. }));

    assert_eq!(mailer.attempts(), 2);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ann@example.com");
}

#[tokio::test]
async fn clones_share_the_outbox() {
    let mailer = RecordingMailer::new();
    let clone = mailer.clone();
    clone.send(&envelope("ann@example.com"), "key").await.unwrap();
    assert_eq!(mailer.sent().len(), 1);

    mailer.fail_all(true);
    assert!(clone.send(&envelope("ann@example.com"), "key").await.is_err());
}

#[tokio::test]
async fn each_failing_recipient_is_tracked() {
    let mailer = RecordingMailer::new();
    mailer.fail_for("ann@example.com");
    mailer.fail_for("bea@example.com");
    mailer.fail_for("ann@example.com");

    for to in ["ann@example.com", "bea@example.com", "cy@example.com"] {
        let _ = mailer.send(&envelope(to), "key").await;
    }

    assert_eq!(mailer.attempts(), 3);
    let sent: Vec<_> = mailer.sent().into_iter().map(|e| e.to).collect();
    assert_eq!(sent, ["cy@example.com"]);
}
