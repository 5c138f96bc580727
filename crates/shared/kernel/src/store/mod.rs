//! Persistence contract for the RSVP features.
//!
//! Invitation codes and the registry record are global; RSVPs and guests live in the table pair
//! selected by [`Environment`]. Record ids are assigned by the store on insert.

#[cfg(feature = "testing")]
mod memory;
mod surreal;

#[cfg(feature = "testing")]
pub use memory::{MemoryStore, StoreOp};
pub use surreal::SurrealStore;

use std::borrow::Cow;
use std::future::Future;
use wed_domain::rsvp::{Environment, Guest, InvitationCode, RegistryConfig, RsvpSubmission, Stored};

#[wed_derive::wed_error]
pub enum StoreError {
    #[error("SurrealDB error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// The backend answered with something that doesn't fit the record shape.
    #[error("Unexpected store response{}: {message}", format_context(.context))]
    Corrupt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Store unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Storage operations needed by submission handling and the confirmation sweep.
pub trait RsvpStore: Send + Sync {
    /// The `registry:rsvp` record, `None` when it was never written.
    fn registry(&self) -> impl Future<Output = Result<Option<RegistryConfig>, StoreError>> + Send;

    /// Creates or replaces the registry record.
    fn put_registry(
        &self,
        registry: &RegistryConfig,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn invitation_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<InvitationCode>, StoreError>> + Send;

    /// Creates or replaces an invitation code.
    fn put_code(&self, code: &InvitationCode) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Decrements the quota of `code` if, and only if, it is still positive.
    ///
    /// Returns the code after the decrement, or `None` when the code is missing or exhausted.
    /// The check and the write are one atomic step.
    fn consume_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<InvitationCode>, StoreError>> + Send;

    /// Gives back one use of `code`; compensates a [`RsvpStore::consume_code`].
    fn restore_code(&self, code: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// At most one RSVP with this email.
    fn find_rsvp_by_email(
        &self,
        env: Environment,
        email: &str,
    ) -> impl Future<Output = Result<Option<Stored<RsvpSubmission>>, StoreError>> + Send;

    /// Inserts an RSVP and returns its id.
    fn insert_rsvp(
        &self,
        env: Environment,
        rsvp: &RsvpSubmission,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Inserts a guest and returns its id.
    fn insert_guest(
        &self,
        env: Environment,
        guest: &Guest,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Replaces the RSVP stored under `rsvp.id`.
    fn save_rsvp(
        &self,
        env: Environment,
        rsvp: &Stored<RsvpSubmission>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove_rsvp(
        &self,
        env: Environment,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove_guest(
        &self,
        env: Environment,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn rsvps(
        &self,
        env: Environment,
    ) -> impl Future<Output = Result<Vec<Stored<RsvpSubmission>>, StoreError>> + Send;

    fn guests(
        &self,
        env: Environment,
    ) -> impl Future<Output = Result<Vec<Stored<Guest>>, StoreError>> + Send;
}
