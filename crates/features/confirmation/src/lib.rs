//! Confirmation sweep feature slice.
//!
//! Sends each party that has answered but not been confirmed an itinerary of who is coming
//! and what they eat, then marks the RSVP confirmed. Reachable over HTTP
//! (`POST /confirmations`) and from the `wed-sweep` binary.

pub mod itinerary;
#[cfg(feature = "server")]
mod handler;
mod sweep;

pub use sweep::{ConfirmationSweeper, SWEEP_DONE, SweepError, SweepErrorExt, SweepSummary};

use wed_database::Database;
use wed_kernel::domain::registry::InitializedSlice;
use wed_kernel::store::SurrealStore;
use wed_mailer::MailTransport;

/// Confirmation feature state
#[wed_derive::wed_slice]
pub struct Confirmation {
    pub sweeper: ConfirmationSweeper<SurrealStore, MailTransport>,
}

/// Builds the production sweeper over the shared database.
#[must_use]
pub fn sweeper(
    database: &Database,
    mailer: MailTransport,
    sender_name: &str,
) -> ConfirmationSweeper<SurrealStore, MailTransport> {
    ConfirmationSweeper::new(SurrealStore::new(database.clone()), mailer, sender_name)
}

#[must_use]
pub fn init(database: &Database, mailer: MailTransport, sender_name: &str) -> InitializedSlice {
    tracing::info!("Confirmation slice initialized");
    InitializedSlice::new(Confirmation::new(ConfirmationInner {
        sweeper: sweeper(database, mailer, sender_name),
    }))
}

/// `POST /confirmations`
#[cfg(feature = "server")]
pub fn router() -> utoipa_axum::router::OpenApiRouter<wed_kernel::server::ApiState> {
    use utoipa_axum::routes;
    utoipa_axum::router::OpenApiRouter::new().routes(routes!(handler::run_sweep))
}
