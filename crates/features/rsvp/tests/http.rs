#![cfg(feature = "server")]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;
use wed_database::Database;
use wed_domain::config::ApiConfig;
use wed_domain::rsvp::{Environment, InvitationCode, RegistryConfig};
use wed_kernel::server::ApiState;
use wed_kernel::store::{RsvpStore, SurrealStore};
use wed_mailer::{LogMailer, MailTransport};
use wed_rsvp::RsvpResponse;

async fn app(db: &str, enabled: bool) -> (Router, SurrealStore) {
    let database = Database::builder().url("mem://").session("test", db).init().await.unwrap();
    let store = SurrealStore::new(database.clone());
    store
        .put_registry(&RegistryConfig {
            enabled,
            sender_email: "us@example.com".into(),
            environment: Environment::Test,
            email_api_key: String::new(),
        })
        .await
        .unwrap();
    store.put_code(&InvitationCode::new("CODE1", 5)).await.unwrap();

    let slice = wed_rsvp::init(&database, MailTransport::from(LogMailer), "Di and Siyu Wedding");
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .db(database)
        .register_slice(slice)
        .build()
        .unwrap();

    let (router, _api) = wed_rsvp::router().split_for_parts();
    (router.with_state(state), store)
}

async fn post(router: Router, content_type: &str, body: &str) -> RsvpResponse {
    let request = Request::builder()
        .method("POST")
        .uri("/rsvp")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_owned()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const FORM: &str = "rsvpCode=CODE1&firstName=Ann&lastName=Lee&email=a%40x.com&hotel=true\
                    &adultCount=1&childCount=0&entree=fish&guestAdultFirstName0=Bob\
                    &guestAdultLastName0=Lee&guestAdultEntree0=beef";

#[tokio::test]
async fn form_submission_is_accepted() {
    let (router, store) = app("form", true).await;

    let reply = post(router, "application/x-www-form-urlencoded", FORM).await;
    assert_eq!(reply, RsvpResponse::success("You've successfully rsvp-ed!"));

    assert_eq!(store.invitation_code("CODE1").await.unwrap().unwrap().remaining_quota, 4);
    assert_eq!(store.rsvps(Environment::Test).await.unwrap().len(), 1);
    assert_eq!(store.guests(Environment::Test).await.unwrap().len(), 2);
}

#[tokio::test]
async fn json_submission_is_accepted_then_duplicate() {
    let (router, store) = app("json", true).await;
    let body = serde_json::json!({
        "rsvpCode": "CODE1",
        "firstName": "Ann",
        "lastName": "Lee",
        "email": "a@x.com",
        "hotel": true,
        "entree": "fish",
        "adultGuests": [{ "firstName": "Bob", "lastName": "Lee", "entree": "beef" }],
    })
    .to_string();

    let reply = post(router.clone(), "application/json", &body).await;
    assert!(reply.success, "{}", reply.message);
    let guests = store.guests(Environment::Test).await.unwrap();
    assert!(guests.iter().any(|g| g.record.full_name() == "Bob Lee" && g.record.guest_of == "Ann Lee"));

    let reply = post(router, "application/x-www-form-urlencoded", FORM).await;
    assert_eq!(reply, RsvpResponse::failure("a@x.com has already RSVP-ed"));
}

#[tokio::test]
async fn rejections_are_reported_with_200() {
    let (router, _store) = app("closed", false).await;
    let reply = post(router, "application/x-www-form-urlencoded", FORM).await;
    assert_eq!(reply, RsvpResponse::failure("Sorry! RSVP not open yet."));

    let (router, _store) = app("nocode", true).await;
    let reply =
        post(router.clone(), "application/x-www-form-urlencoded", "firstName=Ann").await;
    assert_eq!(reply.message, "Missing RSVP code");

    let reply = post(router, "application/json", "{not json").await;
    assert!(!reply.success);
    assert!(reply.message.starts_with("Malformed submission"));
}
