use crate::error::MailError;
use crate::{Envelope, Mailer};
use fxhash::FxHashSet;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<Envelope>,
    failing: FxHashSet<String>,
    fail_all: bool,
    attempts: usize,
}

/// In-memory mailer for tests. Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    state: Arc<Mutex<Recorded>>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery fails while set.
    pub fn fail_all(&self, fail: bool) {
        self.state.lock().fail_all = fail;
    }

    /// Deliveries to `recipient` fail.
    pub fn fail_for(&self, recipient: impl Into<String>) {
        self.state.lock().failing.insert(recipient.into());
    }

    /// Successfully delivered envelopes, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Envelope> {
        self.state.lock().sent.clone()
    }

    /// All delivery attempts, failed ones included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, envelope: &Envelope, _api_key: &str) -> Result<(), MailError> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if state.fail_all || state.failing.contains(&envelope.to) {
            return Err(MailError::Rejected {
                message: format!("delivery to {} refused", envelope.to).into(),
                context: None,
            });
        }
        state.sent.push(envelope.clone());
        Ok(())
    }
}
