//! In-process [`RsvpStore`] for tests, with per-operation fault injection.

use super::{RsvpStore, StoreError};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use wed_domain::rsvp::{Environment, Guest, InvitationCode, RegistryConfig, RsvpSubmission, Stored};

/// Every operation of [`RsvpStore`], used to target injected faults and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Registry,
    PutRegistry,
    InvitationCode,
    PutCode,
    ConsumeCode,
    RestoreCode,
    FindRsvp,
    InsertRsvp,
    InsertGuest,
    SaveRsvp,
    RemoveRsvp,
    RemoveGuest,
    Rsvps,
    Guests,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Always,
    /// Fails once this many calls have succeeded.
    After(usize),
}

#[derive(Debug, Default)]
struct Tables {
    registry: Option<RegistryConfig>,
    codes: FxHashMap<String, i64>,
    rsvps: FxHashMap<Environment, Vec<Stored<RsvpSubmission>>>,
    guests: FxHashMap<Environment, Vec<Stored<Guest>>>,
    next_id: u64,
    faults: FxHashMap<StoreOp, Fault>,
    calls: FxHashMap<StoreOp, usize>,
}

impl Tables {
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        let calls = self.calls.entry(op).or_default();
        let previous = *calls;
        *calls += 1;

        let failing = match self.faults.get(&op) {
            Some(Fault::Always) => true,
            Some(Fault::After(n)) => previous >= *n,
            None => false,
        };

        if failing {
            return Err(StoreError::Unavailable {
                message: "injected fault".into(),
                context: Some(format!("{op:?}").into()),
            });
        }
        Ok(())
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("r{:06}", self.next_id)
    }
}

/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call to `op` fail with [`StoreError::Unavailable`].
    pub fn fail(&self, op: StoreOp) {
        self.tables.lock().faults.insert(op, Fault::Always);
    }

    /// Lets the first `succeed` calls to `op` (counted from now on) through, then fails the rest.
    pub fn fail_after(&self, op: StoreOp, succeed: usize) {
        let mut tables = self.tables.lock();
        let already = tables.calls.get(&op).copied().unwrap_or_default();
        tables.faults.insert(op, Fault::After(already + succeed));
    }

    pub fn clear_faults(&self) {
        self.tables.lock().faults.clear();
    }

    /// Number of times `op` was invoked, failed calls included.
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.tables.lock().calls.get(&op).copied().unwrap_or_default()
    }

    /// Current quota of `code`, bypassing fault injection.
    #[must_use]
    pub fn code_quota(&self, code: &str) -> Option<i64> {
        self.tables.lock().codes.get(code).copied()
    }

    #[must_use]
    pub fn stored_rsvps(&self, env: Environment) -> Vec<Stored<RsvpSubmission>> {
        self.tables.lock().rsvps.get(&env).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn stored_guests(&self, env: Environment) -> Vec<Stored<Guest>> {
        self.tables.lock().guests.get(&env).cloned().unwrap_or_default()
    }
}

impl RsvpStore for MemoryStore {
    async fn registry(&self) -> Result<Option<RegistryConfig>, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::Registry)?;
        Ok(tables.registry.clone())
    }

    async fn put_registry(&self, registry: &RegistryConfig) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::PutRegistry)?;
        tables.registry = Some(registry.clone());
        Ok(())
    }

    async fn invitation_code(&self, code: &str) -> Result<Option<InvitationCode>, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::InvitationCode)?;
        Ok(tables.codes.get(code).map(|quota| InvitationCode::new(code, *quota)))
    }

    async fn put_code(&self, code: &InvitationCode) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::PutCode)?;
        tables.codes.insert(code.code.clone(), code.remaining_quota);
        Ok(())
    }

    async fn consume_code(&self, code: &str) -> Result<Option<InvitationCode>, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::ConsumeCode)?;
        match tables.codes.get_mut(code) {
            Some(quota) if *quota > 0 => {
                *quota -= 1;
                Ok(Some(InvitationCode::new(code, *quota)))
            },
            _ => Ok(None),
        }
    }

    async fn restore_code(&self, code: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::RestoreCode)?;
        if let Some(quota) = tables.codes.get_mut(code) {
            *quota += 1;
        }
        Ok(())
    }

    async fn find_rsvp_by_email(
        &self,
        env: Environment,
        email: &str,
    ) -> Result<Option<Stored<RsvpSubmission>>, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::FindRsvp)?;
        Ok(tables
            .rsvps
            .get(&env)
            .and_then(|rows| rows.iter().find(|row| row.record.email == email))
            .cloned())
    }

    async fn insert_rsvp(&self, env: Environment, rsvp: &RsvpSubmission) -> Result<String, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::InsertRsvp)?;
        let id = tables.next_id();
        tables.rsvps.entry(env).or_default().push(Stored::new(id.clone(), rsvp.clone()));
        Ok(id)
    }

    async fn insert_guest(&self, env: Environment, guest: &Guest) -> Result<String, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::InsertGuest)?;
        let id = tables.next_id();
        tables.guests.entry(env).or_default().push(Stored::new(id.clone(), guest.clone()));
        Ok(id)
    }

    async fn save_rsvp(&self, env: Environment, rsvp: &Stored<RsvpSubmission>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::SaveRsvp)?;
        let existing = tables
            .rsvps
            .get_mut(&env)
            .and_then(|rows| rows.iter_mut().find(|row| row.id == rsvp.id));

        match existing {
            Some(row) => {
                row.record = rsvp.record.clone();
                Ok(())
            },
            None => Err(StoreError::Corrupt {
                message: format!("no {} record with id {}", env.rsvp_table(), rsvp.id).into(),
                context: Some("Saving rsvp".into()),
            }),
        }
    }

    async fn remove_rsvp(&self, env: Environment, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::RemoveRsvp)?;
        if let Some(rows) = tables.rsvps.get_mut(&env) {
            rows.retain(|row| row.id != id);
        }
        Ok(())
    }

    async fn remove_guest(&self, env: Environment, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::RemoveGuest)?;
        if let Some(rows) = tables.guests.get_mut(&env) {
            rows.retain(|row| row.id != id);
        }
        Ok(())
    }

    async fn rsvps(&self, env: Environment) -> Result<Vec<Stored<RsvpSubmission>>, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::Rsvps)?;
        Ok(tables.rsvps.get(&env).cloned().unwrap_or_default())
    }

    async fn guests(&self, env: Environment) -> Result<Vec<Stored<Guest>>, StoreError> {
        let mut tables = self.tables.lock();
        tables.enter(StoreOp::Guests)?;
        Ok(tables.guests.get(&env).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consume_stops_at_zero() {
        let store = MemoryStore::new();
        store.put_code(&InvitationCode::new("ABC", 1)).await.unwrap();

        let consumed = store.consume_code("ABC").await.unwrap().unwrap();
        assert_eq!(consumed.remaining_quota, 0);
        assert!(store.consume_code("ABC").await.unwrap().is_none());
        assert!(store.consume_code("missing").await.unwrap().is_none());
        assert_eq!(store.code_quota("ABC"), Some(0));
    }

    #[tokio::test]
    async fn fail_after_counts_from_now() {
        let store = MemoryStore::new();
        store.registry().await.unwrap();

        store.fail_after(StoreOp::Registry, 1);
        assert!(store.registry().await.is_ok());
        assert!(matches!(store.registry().await, Err(StoreError::Unavailable { .. })));

        store.clear_faults();
        assert!(store.registry().await.is_ok());
        assert_eq!(store.calls(StoreOp::Registry), 4);
    }

    #[tokio::test]
    async fn environments_are_isolated() {
        let store = MemoryStore::new();
        let rsvp = RsvpSubmission { email: "a@x.com".into(), ..RsvpSubmission::default() };
        store.insert_rsvp(Environment::Test, &rsvp).await.unwrap();

        assert!(store.find_rsvp_by_email(Environment::Test, "a@x.com").await.unwrap().is_some());
        assert!(store.find_rsvp_by_email(Environment::Prod, "a@x.com").await.unwrap().is_none());
    }
}
