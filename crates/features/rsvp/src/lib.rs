//! RSVP submission feature slice.
//!
//! A submission passes the registry gate and the invitation-code gate, is parsed into an
//! [`RsvpSubmission`](wed_domain::rsvp::RsvpSubmission) plus its guests, checked against
//! earlier answers, and stored against one use of the code. See [`RsvpService::submit`].

mod dto;
mod error;
pub mod form;
#[cfg(feature = "server")]
mod handler;
mod service;

pub use dto::{GuestEntry, RsvpRequest, RsvpResponse};
pub use error::{INFRA_FAILURE_MESSAGE, RsvpError, RsvpErrorExt};
pub use form::{FormError, ParsedRsvp, RsvpForm, parse_rsvp};
pub use service::{ACK_BODY, ACK_SUBJECT, Receipt, RsvpService, SUCCESS_MESSAGE};

use wed_database::Database;
use wed_kernel::domain::registry::InitializedSlice;
use wed_kernel::store::SurrealStore;
use wed_mailer::MailTransport;

/// RSVP feature state
#[wed_derive::wed_slice]
pub struct Rsvp {
    pub service: RsvpService<SurrealStore, MailTransport>,
}

/// Wires the submission service to the shared database and the configured mail transport.
#[must_use]
pub fn init(database: &Database, mailer: MailTransport, sender_name: &str) -> InitializedSlice {
    let service = RsvpService::new(SurrealStore::new(database.clone()), mailer, sender_name);
    tracing::info!("RSVP slice initialized");
    InitializedSlice::new(Rsvp::new(RsvpInner { service }))
}

/// `POST /rsvp`
#[cfg(feature = "server")]
pub fn router() -> utoipa_axum::router::OpenApiRouter<wed_kernel::server::ApiState> {
    use utoipa_axum::routes;
    utoipa_axum::router::OpenApiRouter::new().routes(routes!(handler::submit_rsvp))
}
