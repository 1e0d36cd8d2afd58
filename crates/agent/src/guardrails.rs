use chrono::{DateTime, Utc};
use folio_core::domain::session::Session;
use folio_core::guard::{InputGuard, RejectReason, ValidationOutcome};
use folio_core::replies::ReplyCatalog;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    Rejected(RejectReason),
    OffTopic,
}

impl DenyReason {
    pub fn reason_code(self) -> &'static str {
        match self {
            Self::Rejected(reason) => reason.reason_code(),
            Self::OffTopic => "off_topic",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow { sanitized: String },
    Deny { reason: DenyReason, reason_code: &'static str, user_message: String },
}

/// Input guard plus off-topic screen, mapped to the reply shown to the
/// visitor when a message is refused.
#[derive(Clone, Debug)]
pub struct GuardrailPolicy {
    guard: InputGuard,
    replies: ReplyCatalog,
}

impl GuardrailPolicy {
    pub fn new(guard: InputGuard, replies: ReplyCatalog) -> Self {
        Self { guard, replies }
    }

    pub fn guard(&self) -> &InputGuard {
        &self.guard
    }

    /// The off-topic screen runs on the raw text, after the message has
    /// already been accepted (and counted) by the guard.
    pub fn evaluate(&self, session: &mut Session, text: &str, now: DateTime<Utc>) -> GuardrailDecision {
        match self.guard.validate(session, text, now) {
            ValidationOutcome::Rejected { reason } => GuardrailDecision::Deny {
                reason: DenyReason::Rejected(reason),
                reason_code: reason.reason_code(),
                user_message: self.replies.security(reason),
            },
            ValidationOutcome::Accepted { .. } if self.guard.is_off_topic(text) => {
                GuardrailDecision::Deny {
                    reason: DenyReason::OffTopic,
                    reason_code: DenyReason::OffTopic.reason_code(),
                    user_message: self.replies.off_topic(),
                }
            }
            ValidationOutcome::Accepted { sanitized } => GuardrailDecision::Allow { sanitized },
        }
    }
}
