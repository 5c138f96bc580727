use crate::itinerary::{self, ITINERARY_SUBJECT};
use std::borrow::Cow;
use tracing::{error, info, instrument, warn};
use wed_domain::rsvp::{Guest, RegistryConfig, RsvpSubmission, Stored};
use wed_kernel::store::{RsvpStore, StoreError};
use wed_mailer::{Envelope, Mailer};

/// Last line of a sweep that got through every RSVP.
pub const SWEEP_DONE: &str = "success!";

#[wed_derive::wed_error]
pub enum SweepError {
    #[error("Registry record is missing")]
    RegistryMissing,

    #[error("Store error{}: {source}", format_context(.context))]
    Store {
        #[source]
        source: StoreError,
        context: Option<Cow<'static, str>>,
    },
}

/// Per-party outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Itinerary sent and the RSVP marked confirmed.
    pub confirmed: usize,
    /// Send failed; the RSVP stays unconfirmed for the next sweep.
    pub failed: usize,
    /// Itinerary sent but the flag could not be written back.
    pub unsaved: usize,
}

/// Emails itineraries to every party that has not been confirmed yet.
#[derive(Debug, Clone)]
pub struct ConfirmationSweeper<S, M> {
    store: S,
    mailer: M,
    sender_name: String,
}

impl<S, M> ConfirmationSweeper<S, M>
where
    S: RsvpStore,
    M: Mailer,
{
    pub fn new(store: S, mailer: M, sender_name: impl Into<String>) -> Self {
        Self { store, mailer, sender_name: sender_name.into() }
    }

    /// Runs one sweep, passing each progress line to `report`.
    ///
    /// Per-party failures are reported and skipped. The final line is [`SWEEP_DONE`], or
    /// `error: ...` when the registry, guests or RSVPs cannot be read.
    ///
    /// # Errors
    /// Returns [`SweepError`] for the fatal read failures above.
    #[instrument(skip_all)]
    pub async fn run<F>(&self, mut report: F) -> Result<SweepSummary, SweepError>
    where
        F: FnMut(String) + Send,
    {
        let (registry, guests, rsvps) = match self.load().await {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(error = %err, "Confirmation sweep aborted");
                report(format!("error: {err}"));
                return Err(err);
            },
        };

        let mut summary = SweepSummary::default();
        for rsvp in rsvps.into_iter().filter(|rsvp| !rsvp.record.confirmation_sent) {
            let line = self.confirm(&registry, &guests, rsvp, &mut summary).await;
            report(line);
        }

        info!(
            confirmed = summary.confirmed,
            failed = summary.failed,
            unsaved = summary.unsaved,
            "Confirmation sweep finished"
        );
        report(SWEEP_DONE.to_owned());
        Ok(summary)
    }

    async fn load(
        &self,
    ) -> Result<(RegistryConfig, Vec<Stored<Guest>>, Vec<Stored<RsvpSubmission>>), SweepError>
    {
        let registry = self
            .store
            .registry()
            .await
            .context("Loading registry")?
            .ok_or(SweepError::RegistryMissing)?;
        let env = registry.environment;
        let guests = self.store.guests(env).await.context("Loading guests")?;
        let rsvps = self.store.rsvps(env).await.context("Loading rsvps")?;
        Ok((registry, guests, rsvps))
    }

    async fn confirm(
        &self,
        registry: &RegistryConfig,
        guests: &[Stored<Guest>],
        mut rsvp: Stored<RsvpSubmission>,
        summary: &mut SweepSummary,
    ) -> String {
        let party: Vec<&Guest> = guests
            .iter()
            .map(|guest| &guest.record)
            .filter(|guest| guest.belongs_to(&rsvp.record))
            .collect();
        let who = format!("{} <{}>", rsvp.record.full_name(), rsvp.record.email);

        let envelope = Envelope {
            sender_name: self.sender_name.clone(),
            sender_email: registry.sender_email.clone(),
            to: rsvp.record.email.clone(),
            subject: ITINERARY_SUBJECT.to_owned(),
            body: itinerary::compose(&rsvp.record, &party),
        };

        if let Err(err) = self.mailer.send(&envelope, &registry.email_api_key).await {
            warn!(to = %rsvp.record.email, error = %err, "Itinerary not delivered");
            summary.failed += 1;
            return format!("{who}: failed to send itinerary: {err}");
        }

        rsvp.record.confirmation_sent = true;
        match self.store.save_rsvp(registry.environment, &rsvp).await {
            Ok(()) => {
                summary.confirmed += 1;
                format!("{who}: itinerary sent ({} guests)", party.len())
            },
            Err(err) => {
                error!(id = %rsvp.id, error = %err, "Itinerary sent but rsvp not marked confirmed");
                summary.unsaved += 1;
                format!("{who}: itinerary sent, but marking it confirmed failed: {err}")
            },
        }
    }
}
