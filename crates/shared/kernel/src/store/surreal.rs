use super::{RsvpStore, StoreError, StoreErrorExt};
use std::future::Future;
use std::time::Duration;
use surrealdb::types::{QueryError, SurrealValue};
use tracing::{debug, instrument};
use wed_database::Database;
use wed_domain::constants::{CODE_TABLE, REGISTRY_KEY, REGISTRY_TABLE};
use wed_domain::rsvp::{Environment, Guest, InvitationCode, RegistryConfig, RsvpSubmission, Stored};

const RSVP_FIELDS: &str = "first_name, last_name, email, staying_at_hotel, adult_guest_count, \
                           child_guest_count, extra_notes, confirmation_sent";
const GUEST_FIELDS: &str = "first_name, last_name, is_child, meal_option, guest_of";

/// Quota updates touch one shared record, so concurrent submissions of the same code collide in
/// optimistic transactions. Each round commits at least one of them.
const CONFLICT_ATTEMPTS: u32 = 16;
const CONFLICT_BACKOFF: Duration = Duration::from_millis(2);

/// [`RsvpStore`] over the shared `SurrealDB` session.
///
/// Table names come from constants and [`Environment`], never from request data; everything
/// caller-supplied is bound as a parameter.
#[derive(Debug, Clone)]
pub struct SurrealStore {
    db: Database,
}

impl SurrealStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(Debug, SurrealValue)]
struct RegistryRow {
    enabled: bool,
    sender_email: String,
    environment: String,
    email_api_key: String,
}

#[derive(Debug, SurrealValue)]
struct CodeRow {
    code: String,
    remaining_quota: i64,
}

#[derive(Debug, SurrealValue)]
struct RsvpRow {
    first_name: String,
    last_name: String,
    email: String,
    staying_at_hotel: bool,
    adult_guest_count: i64,
    child_guest_count: i64,
    extra_notes: String,
    confirmation_sent: bool,
}

#[derive(Debug, SurrealValue)]
struct KeyedRsvpRow {
    key: String,
    first_name: String,
    last_name: String,
    email: String,
    staying_at_hotel: bool,
    adult_guest_count: i64,
    child_guest_count: i64,
    extra_notes: String,
    confirmation_sent: bool,
}

#[derive(Debug, SurrealValue)]
struct GuestRow {
    first_name: String,
    last_name: String,
    is_child: bool,
    meal_option: String,
    guest_of: String,
}

#[derive(Debug, SurrealValue)]
struct KeyedGuestRow {
    key: String,
    first_name: String,
    last_name: String,
    is_child: bool,
    meal_option: String,
    guest_of: String,
}

#[derive(Debug, SurrealValue)]
struct KeyRow {
    key: String,
}

impl From<&RegistryConfig> for RegistryRow {
    fn from(registry: &RegistryConfig) -> Self {
        Self {
            enabled: registry.enabled,
            sender_email: registry.sender_email.clone(),
            environment: registry.environment.as_str().to_owned(),
            email_api_key: registry.email_api_key.clone(),
        }
    }
}

impl From<RegistryRow> for RegistryConfig {
    fn from(row: RegistryRow) -> Self {
        Self {
            enabled: row.enabled,
            sender_email: row.sender_email,
            environment: Environment::from_stored(&row.environment),
            email_api_key: row.email_api_key,
        }
    }
}

impl From<CodeRow> for InvitationCode {
    fn from(row: CodeRow) -> Self {
        Self { code: row.code, remaining_quota: row.remaining_quota }
    }
}

impl From<&RsvpSubmission> for RsvpRow {
    fn from(rsvp: &RsvpSubmission) -> Self {
        Self {
            first_name: rsvp.first_name.clone(),
            last_name: rsvp.last_name.clone(),
            email: rsvp.email.clone(),
            staying_at_hotel: rsvp.staying_at_hotel,
            adult_guest_count: rsvp.adult_guest_count,
            child_guest_count: rsvp.child_guest_count,
            extra_notes: rsvp.extra_notes.clone(),
            confirmation_sent: rsvp.confirmation_sent,
        }
    }
}

impl From<KeyedRsvpRow> for Stored<RsvpSubmission> {
    fn from(row: KeyedRsvpRow) -> Self {
        Self::new(
            row.key,
            RsvpSubmission {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                staying_at_hotel: row.staying_at_hotel,
                adult_guest_count: row.adult_guest_count,
                child_guest_count: row.child_guest_count,
                extra_notes: row.extra_notes,
                confirmation_sent: row.confirmation_sent,
            },
        )
    }
}

impl From<&Guest> for GuestRow {
    fn from(guest: &Guest) -> Self {
        Self {
            first_name: guest.first_name.clone(),
            last_name: guest.last_name.clone(),
            is_child: guest.is_child,
            meal_option: guest.meal_option.clone(),
            guest_of: guest.guest_of.clone(),
        }
    }
}

impl From<KeyedGuestRow> for Stored<Guest> {
    fn from(row: KeyedGuestRow) -> Self {
        Self::new(
            row.key,
            Guest {
                first_name: row.first_name,
                last_name: row.last_name,
                is_child: row.is_child,
                meal_option: row.meal_option,
                guest_of: row.guest_of,
            },
        )
    }
}

fn single_key(keys: Vec<KeyRow>, table: &str) -> Result<String, StoreError> {
    keys.into_iter().next().map(|row| row.key).ok_or_else(|| StoreError::Corrupt {
        message: "insert returned no record".into(),
        context: Some(table.to_owned().into()),
    })
}

fn is_transaction_conflict(err: &surrealdb::Error) -> bool {
    std::iter::successors(Some(err), |err| err.cause())
        .any(|err| err.query_details() == Some(&QueryError::TransactionConflict))
}

/// Re-runs `statement` while it loses a transaction conflict, up to [`CONFLICT_ATTEMPTS`] times.
async fn retry_on_conflict<T, F, Fut>(op: &'static str, mut statement: F) -> Result<T, surrealdb::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, surrealdb::Error>>,
{
    let mut attempt = 1;
    loop {
        match statement().await {
            Err(err) if attempt < CONFLICT_ATTEMPTS && is_transaction_conflict(&err) => {
                debug!(op, attempt, "Transaction conflict, retrying");
                tokio::time::sleep(CONFLICT_BACKOFF * attempt).await;
                attempt += 1;
            },
            outcome => return outcome,
        }
    }
}

impl RsvpStore for SurrealStore {
    async fn registry(&self) -> Result<Option<RegistryConfig>, StoreError> {
        let row = self
            .db
            .query(format!(
                "SELECT enabled, sender_email, environment, email_api_key \
                 FROM ONLY {REGISTRY_TABLE}:{REGISTRY_KEY}"
            ))
            .await
            .context("Loading registry")?
            .take::<Option<RegistryRow>>(0)
            .context("Decoding registry")?;
        Ok(row.map(RegistryConfig::from))
    }

    async fn put_registry(&self, registry: &RegistryConfig) -> Result<(), StoreError> {
        self.db
            .query(format!("UPSERT {REGISTRY_TABLE}:{REGISTRY_KEY} CONTENT $record"))
            .bind(("record", RegistryRow::from(registry)))
            .await
            .context("Writing registry")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Writing registry")?;
        Ok(())
    }

    async fn invitation_code(&self, code: &str) -> Result<Option<InvitationCode>, StoreError> {
        let rows = self
            .db
            .query(format!(
                "SELECT code, remaining_quota FROM {CODE_TABLE} WHERE code = $code LIMIT 1"
            ))
            .bind(("code", code.to_owned()))
            .await
            .context("Loading invitation code")?
            .take::<Vec<CodeRow>>(0)
            .context("Decoding invitation code")?;
        Ok(rows.into_iter().next().map(InvitationCode::from))
    }

    async fn put_code(&self, code: &InvitationCode) -> Result<(), StoreError> {
        self.db
            .query(format!(
                "BEGIN TRANSACTION;
                DELETE {CODE_TABLE} WHERE code = $code;
                CREATE {CODE_TABLE} SET code = $code, remaining_quota = $quota;
                COMMIT TRANSACTION;"
            ))
            .bind(("code", code.code.clone()))
            .bind(("quota", code.remaining_quota))
            .await
            .context("Writing invitation code")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Writing invitation code")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn consume_code(&self, code: &str) -> Result<Option<InvitationCode>, StoreError> {
        let statement = format!(
            "UPDATE {CODE_TABLE} SET remaining_quota -= 1 \
             WHERE code = $code AND remaining_quota > 0 \
             RETURN code, remaining_quota"
        );
        let (db, sql) = (&self.db, statement.as_str());
        let rows = retry_on_conflict("consume_code", move || async move {
            db.query(sql).bind(("code", code.to_owned())).await?.take::<Vec<CodeRow>>(0)
        })
        .await
        .context("Consuming invitation code")?;
        Ok(rows.into_iter().next().map(InvitationCode::from))
    }

    #[instrument(skip(self))]
    async fn restore_code(&self, code: &str) -> Result<(), StoreError> {
        let statement = format!("UPDATE {CODE_TABLE} SET remaining_quota += 1 WHERE code = $code");
        let (db, sql) = (&self.db, statement.as_str());
        retry_on_conflict("restore_code", move || async move {
            db.query(sql)
                .bind(("code", code.to_owned()))
                .await?
                .check()
                .map_err(surrealdb::Error::from)
        })
        .await
        .context("Restoring invitation code")?;
        Ok(())
    }

    async fn find_rsvp_by_email(
        &self,
        env: Environment,
        email: &str,
    ) -> Result<Option<Stored<RsvpSubmission>>, StoreError> {
        let table = env.rsvp_table();
        let rows = self
            .db
            .query(format!(
                "SELECT id.id() AS key, {RSVP_FIELDS} FROM {table} WHERE email = $email LIMIT 1"
            ))
            .bind(("email", email.to_owned()))
            .await
            .context("Looking up rsvp by email")?
            .take::<Vec<KeyedRsvpRow>>(0)
            .context("Decoding rsvp")?;
        Ok(rows.into_iter().next().map(Stored::from))
    }

    async fn insert_rsvp(&self, env: Environment, rsvp: &RsvpSubmission) -> Result<String, StoreError> {
        let table = env.rsvp_table();
        let keys = self
            .db
            .query(format!("CREATE {table} CONTENT $record RETURN id.id() AS key"))
            .bind(("record", RsvpRow::from(rsvp)))
            .await
            .context("Inserting rsvp")?
            .take::<Vec<KeyRow>>(0)
            .context("Inserting rsvp")?;
        single_key(keys, table)
    }

    async fn insert_guest(&self, env: Environment, guest: &Guest) -> Result<String, StoreError> {
        let table = env.guest_table();
        let keys = self
            .db
            .query(format!("CREATE {table} CONTENT $record RETURN id.id() AS key"))
            .bind(("record", GuestRow::from(guest)))
            .await
            .context("Inserting guest")?
            .take::<Vec<KeyRow>>(0)
            .context("Inserting guest")?;
        single_key(keys, table)
    }

    async fn save_rsvp(&self, env: Environment, rsvp: &Stored<RsvpSubmission>) -> Result<(), StoreError> {
        let table = env.rsvp_table();
        let updated = self
            .db
            .query(format!("UPDATE {table} CONTENT $record WHERE id.id() = $key RETURN id.id() AS key"))
            .bind(("record", RsvpRow::from(&rsvp.record)))
            .bind(("key", rsvp.id.clone()))
            .await
            .context("Saving rsvp")?
            .take::<Vec<KeyRow>>(0)
            .context("Saving rsvp")?;

        if updated.is_empty() {
            return Err(StoreError::Corrupt {
                message: format!("no {table} record with id {}", rsvp.id).into(),
                context: Some("Saving rsvp".into()),
            });
        }
        Ok(())
    }

    async fn remove_rsvp(&self, env: Environment, id: &str) -> Result<(), StoreError> {
        let table = env.rsvp_table();
        self.db
            .query(format!("DELETE {table} WHERE id.id() = $key"))
            .bind(("key", id.to_owned()))
            .await
            .context("Removing rsvp")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Removing rsvp")?;
        Ok(())
    }

    async fn remove_guest(&self, env: Environment, id: &str) -> Result<(), StoreError> {
        let table = env.guest_table();
        self.db
            .query(format!("DELETE {table} WHERE id.id() = $key"))
            .bind(("key", id.to_owned()))
            .await
            .context("Removing guest")?
            .check()
            .map_err(surrealdb::Error::from)
            .context("Removing guest")?;
        Ok(())
    }

    async fn rsvps(&self, env: Environment) -> Result<Vec<Stored<RsvpSubmission>>, StoreError> {
        let table = env.rsvp_table();
        let rows = self
            .db
            .query(format!("SELECT id.id() AS key, {RSVP_FIELDS} FROM {table}"))
            .await
            .context("Listing rsvps")?
            .take::<Vec<KeyedRsvpRow>>(0)
            .context("Decoding rsvps")?;
        Ok(rows.into_iter().map(Stored::from).collect())
    }

    async fn guests(&self, env: Environment) -> Result<Vec<Stored<Guest>>, StoreError> {
        let table = env.guest_table();
        let rows = self
            .db
            .query(format!("SELECT id.id() AS key, {GUEST_FIELDS} FROM {table}"))
            .await
            .context("Listing guests")?
            .take::<Vec<KeyedGuestRow>>(0)
            .context("Decoding guests")?;
        Ok(rows.into_iter().map(Stored::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> surrealdb::Error {
        surrealdb::Error::query("transaction conflict".to_owned(), QueryError::TransactionConflict)
    }

    #[test]
    fn conflicts_are_recognised_through_causes() {
        assert!(is_transaction_conflict(&conflict()));
        let wrapped = surrealdb::Error::internal("commit".to_owned()).with_cause(conflict());
        assert!(is_transaction_conflict(&wrapped));
        assert!(!is_transaction_conflict(&surrealdb::Error::query("timeout".to_owned(), None::<QueryError>)));
    }

    #[tokio::test]
    async fn conflicting_statement_is_rerun_until_it_commits() {
        let calls = &AtomicU32::new(0);
        let outcome = retry_on_conflict("test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err(conflict()) } else { Ok(7) }
        })
        .await;

        assert_eq!(outcome.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_and_exhausted_retries_are_returned() {
        let calls = &AtomicU32::new(0);
        let outcome: Result<(), _> = retry_on_conflict("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(surrealdb::Error::internal("disk".to_owned()))
        })
        .await;
        assert!(outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = &AtomicU32::new(0);
        let outcome: Result<(), _> = retry_on_conflict("test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;
        assert!(is_transaction_conflict(&outcome.unwrap_err()));
        assert_eq!(calls.load(Ordering::SeqCst), CONFLICT_ATTEMPTS);
    }
}
