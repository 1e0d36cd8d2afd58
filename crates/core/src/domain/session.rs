use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-visitor counters consulted by the input guard.
///
/// Counters only ever grow; a fresh session is the only way to reset them.
/// Mutation is restricted to the guard in this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    message_count: u32,
    last_message_at: Option<DateTime<Utc>>,
    lead_submission_count: u32,
    flagged_attempt_count: u32,
}

impl Session {
    pub fn new(id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            message_count: 0,
            last_message_at: None,
            lead_submission_count: 0,
            flagged_attempt_count: 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.last_message_at
    }

    pub fn lead_submission_count(&self) -> u32 {
        self.lead_submission_count
    }

    pub fn flagged_attempt_count(&self) -> u32 {
        self.flagged_attempt_count
    }

    pub(crate) fn record_accepted(&mut self, at: DateTime<Utc>) {
        self.message_count = self.message_count.saturating_add(1);
        self.last_message_at = Some(at);
    }

    pub(crate) fn record_flagged(&mut self) {
        self.flagged_attempt_count = self.flagged_attempt_count.saturating_add(1);
    }

    pub(crate) fn record_lead_submission(&mut self) {
        self.lead_submission_count = self.lead_submission_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Session, SessionId};

    #[test]
    fn fresh_session_starts_with_zeroed_counters() {
        let session = Session::new(SessionId("s-1".to_string()), Utc::now());

        assert_eq!(session.id().as_str(), "s-1");
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.lead_submission_count(), 0);
        assert_eq!(session.flagged_attempt_count(), 0);
        assert!(session.last_message_at().is_none());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
