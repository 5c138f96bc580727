//! Orchestrates one submission from the registry gate to the acknowledgement email.

use crate::error::{RsvpError, RsvpErrorExt};
use crate::form::{ParsedRsvp, RsvpForm, parse_rsvp};
use tracing::{error, info, instrument, warn};
use wed_domain::rsvp::{Environment, RegistryConfig};
use wed_kernel::store::RsvpStore;
use wed_mailer::{Envelope, Mailer};

pub const SUCCESS_MESSAGE: &str = "You've successfully rsvp-ed!";
pub const ACK_SUBJECT: &str = "You've Successfully RSVP-ed";
pub const ACK_BODY: &str =
    "Thank you for RSVP-ing, we look forward to seeing you on our wedding!";

/// What an accepted submission left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub environment: Environment,
    pub rsvp_id: String,
    pub guest_ids: Vec<String>,
    /// Quota of the code after this submission.
    pub remaining_quota: i64,
    /// `false` when the acknowledgement could not be delivered.
    pub acknowledged: bool,
}

/// Records written so far by one submission; undone if a later write fails.
#[derive(Debug, Default)]
struct Written {
    rsvp: Option<String>,
    guests: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RsvpService<S, M> {
    store: S,
    mailer: M,
    sender_name: String,
}

impl<S, M> RsvpService<S, M>
where
    S: RsvpStore,
    M: Mailer,
{
    pub fn new(store: S, mailer: M, sender_name: impl Into<String>) -> Self {
        Self { store, mailer, sender_name: sender_name.into() }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Runs one submission.
    ///
    /// The first failing step ends the request. Nothing is written before the code quota is
    /// taken; if a record write fails afterwards, the records written so far are removed and
    /// the quota is given back. A failed acknowledgement email does not fail the submission.
    ///
    /// # Errors
    /// Rejections ([`RsvpError::is_rejection`]) for closed registry, bad or used-up codes,
    /// invalid fields and duplicate emails; [`RsvpError::Store`] /
    /// [`RsvpError::RegistryMissing`] for infrastructure failures.
    #[instrument(skip_all, fields(code = %form.rsvp_code.trim()))]
    pub async fn submit(&self, form: &RsvpForm) -> Result<Receipt, RsvpError> {
        let registry = self.open_registry().await?;
        let code = self.check_code(form.rsvp_code.trim()).await?;

        let env = registry.environment;
        let parsed = parse_rsvp(form)?;
        let email = parsed.submission.email.clone();

        if self
            .store
            .find_rsvp_by_email(env, &email)
            .await
            .context("Checking for a previous rsvp")?
            .is_some()
        {
            return Err(RsvpError::Duplicate { email });
        }

        let Some(consumed) =
            self.store.consume_code(&code).await.context("Consuming invitation code")?
        else {
            return Err(RsvpError::ExpiredCode);
        };

        let mut written = Written::default();
        if let Err(err) = self.write_records(env, &parsed, &mut written).await {
            self.compensate(env, &code, written).await;
            return Err(err);
        }

        let acknowledged = self.acknowledge(&registry, &email).await;
        info!(
            %env,
            %email,
            guests = written.guests.len(),
            remaining = consumed.remaining_quota,
            "RSVP recorded"
        );

        Ok(Receipt {
            environment: env,
            rsvp_id: written.rsvp.unwrap_or_default(),
            guest_ids: written.guests,
            remaining_quota: consumed.remaining_quota,
            acknowledged,
        })
    }

    async fn open_registry(&self) -> Result<RegistryConfig, RsvpError> {
        let registry = self
            .store
            .registry()
            .await
            .context("Loading registry")?
            .ok_or(RsvpError::RegistryMissing)?;

        if registry.enabled { Ok(registry) } else { Err(RsvpError::Closed) }
    }

    /// Read-only look at the code; the quota is only taken after the form checks out.
    async fn check_code(&self, code: &str) -> Result<String, RsvpError> {
        if code.is_empty() {
            return Err(RsvpError::MissingCode);
        }

        let found = match self.store.invitation_code(code).await {
            Ok(Some(found)) => found,
            Ok(None) => return Err(RsvpError::WrongCode),
            Err(err) => {
                warn!(error = %err, "Invitation code lookup failed");
                return Err(RsvpError::WrongCode);
            },
        };

        if found.is_exhausted() { Err(RsvpError::ExpiredCode) } else { Ok(found.code) }
    }

    async fn write_records(
        &self,
        env: Environment,
        parsed: &ParsedRsvp,
        written: &mut Written,
    ) -> Result<(), RsvpError> {
        let id = self.store.insert_rsvp(env, &parsed.submission).await.context("Inserting rsvp")?;
        written.rsvp = Some(id);

        for guest in &parsed.guests {
            let id = self.store.insert_guest(env, guest).await.context("Inserting guest")?;
            written.guests.push(id);
        }
        Ok(())
    }

    /// Best effort; failures are logged and the original error is what the caller sees.
    async fn compensate(&self, env: Environment, code: &str, written: Written) {
        for id in &written.guests {
            if let Err(err) = self.store.remove_guest(env, id).await {
                error!(%env, %id, error = %err, "Failed to remove guest after aborted rsvp");
            }
        }
        if let Some(id) = &written.rsvp
            && let Err(err) = self.store.remove_rsvp(env, id).await
        {
            error!(%env, %id, error = %err, "Failed to remove rsvp after aborted submission");
        }
        if let Err(err) = self.store.restore_code(code).await {
            error!(%code, error = %err, "Failed to restore invitation code quota");
        }
    }

    async fn acknowledge(&self, registry: &RegistryConfig, to: &str) -> bool {
        let envelope = Envelope {
            sender_name: self.sender_name.clone(),
            sender_email: registry.sender_email.clone(),
            to: to.to_owned(),
            subject: ACK_SUBJECT.to_owned(),
            body: ACK_BODY.to_owned(),
        };

        match self.mailer.send(&envelope, &registry.email_api_key).await {
            Ok(()) => true,
            Err(err) => {
                error!(%to, error = %err, "Failed to send rsvp acknowledgement");
                false
            },
        }
    }
}
