use chrono::{DateTime, Utc};
use folio_core::capture::LeadCapture;
use folio_core::domain::session::{Session, SessionId};
use folio_core::intent::Intent;
use serde_json::Value;

/// Everything the runtime keeps for one visitor: guard counters, capture
/// machine, pending offer and remote conversation history.
#[derive(Clone, Debug)]
pub struct ChatSession {
    pub(crate) session: Session,
    pub(crate) capture: LeadCapture,
    pub(crate) pending_offer: Option<Intent>,
    pub(crate) history: Vec<Value>,
    pub(crate) project_interest: Option<String>,
    last_active: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            session: Session::new(id, now),
            capture: LeadCapture::default(),
            pending_offer: None,
            history: Vec::new(),
            project_interest: None,
            last_active: now,
        }
    }

    pub fn start(now: DateTime<Utc>) -> Self {
        Self::new(SessionId::generate(), now)
    }

    pub fn id(&self) -> &SessionId {
        self.session.id()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn capture(&self) -> &LeadCapture {
        &self.capture
    }

    pub fn pending_offer(&self) -> Option<Intent> {
        self.pending_offer
    }

    pub fn history(&self) -> &[Value] {
        &self.history
    }

    pub fn project_interest(&self) -> Option<&str> {
        self.project_interest.as_deref()
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_active < cutoff
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }
}
