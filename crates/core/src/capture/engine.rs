use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::capture::states::{CaptureAction, CaptureEvent, CaptureState, TransitionOutcome};
use crate::domain::lead::{LeadDraft, LeadRecord};
use crate::guard::unescape;
use crate::intent::Intent;
use crate::patterns::{PatternTable, TextClassifier};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CaptureTransitionError {
    #[error("invalid capture transition from {state:?} using event {event:?}")]
    InvalidTransition { state: CaptureState, event: CaptureEvent },
    #[error("capture completed with unset fields: {missing_fields:?}")]
    IncompleteDraft { missing_fields: Vec<&'static str> },
}

/// What the visitor should be asked next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapturePrompt {
    Opening(Intent),
    NameRetry,
    EmailAsk { name: String },
    EmailRetry,
    CompanyAsk,
    RoleAsk,
    ContextAsk(Intent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue(CapturePrompt),
    Complete(LeadRecord),
    /// The machine was not collecting; the text was not consumed.
    Inactive,
}

/// The lead-capture transition table. Linear, no skipping; `Started` and
/// `Reset` are accepted from any state.
pub fn transition(
    current: CaptureState,
    event: CaptureEvent,
) -> Result<TransitionOutcome, CaptureTransitionError> {
    use CaptureAction::{
        ClearDraft, EmitLead, PromptForCompany, PromptForContext, PromptForEmail, PromptForName,
        PromptForRole, StampIntent,
    };
    use CaptureEvent::{
        CompanyProvided, EmailAccepted, MessageProvided, NameAccepted, Reset, RoleProvided,
        Started,
    };
    use CaptureState::{
        AwaitingCompany, AwaitingEmail, AwaitingMessage, AwaitingName, AwaitingRole, Complete,
        Idle,
    };

    let (to, actions) = match (current, event) {
        (_, Started(_)) => (AwaitingName, vec![ClearDraft, StampIntent, PromptForName]),
        (AwaitingName, NameAccepted) => (AwaitingEmail, vec![PromptForEmail]),
        (AwaitingEmail, EmailAccepted) => (AwaitingCompany, vec![PromptForCompany]),
        (AwaitingCompany, CompanyProvided) => (AwaitingRole, vec![PromptForRole]),
        (AwaitingRole, RoleProvided) => (AwaitingMessage, vec![PromptForContext]),
        (AwaitingMessage, MessageProvided) => (Complete, vec![EmitLead]),
        (_, Reset) => (Idle, vec![ClearDraft]),
        _ => return Err(CaptureTransitionError::InvalidTransition { state: current, event }),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}

/// At least two visible characters and no digits.
pub fn is_valid_name(text: &str) -> bool {
    let visible = unescape(text.trim());
    visible.chars().count() >= 2 && !visible.chars().any(|character| character.is_ascii_digit())
}

/// Basic `local@domain.tld` shape.
pub fn is_valid_email(text: &str) -> bool {
    static EMAIL_SHAPE: OnceLock<PatternTable<()>> = OnceLock::new();
    EMAIL_SHAPE
        .get_or_init(|| PatternTable::compile([((), r"^[^\s@]+@[^\s@]+\.[^\s@]+$")]))
        .matches(text.trim())
}

/// Multi-step form filled by visitor replies. Owns the draft until the
/// final step hands the finished record back by value.
#[derive(Clone, Debug)]
pub struct LeadCapture {
    state: CaptureState,
    draft: LeadDraft,
}

impl Default for LeadCapture {
    fn default() -> Self {
        Self { state: CaptureState::Idle, draft: LeadDraft::default() }
    }
}

impl LeadCapture {
    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn draft(&self) -> &LeadDraft {
        &self.draft
    }

    pub fn is_collecting(&self) -> bool {
        self.state.is_collecting()
    }

    pub fn start(
        &mut self,
        intent: Intent,
        project_interest: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CapturePrompt, CaptureTransitionError> {
        self.apply(CaptureEvent::Started(intent))?;
        self.draft = LeadDraft::started(intent, project_interest, now);
        Ok(CapturePrompt::Opening(intent))
    }

    /// Feeds one visitor reply to the current step. Malformed names and
    /// e-mail addresses re-prompt without advancing.
    pub fn process_step(&mut self, text: &str) -> Result<StepOutcome, CaptureTransitionError> {
        let clean = text.trim();

        match self.state {
            CaptureState::AwaitingName => {
                if !is_valid_name(clean) {
                    return Ok(StepOutcome::Continue(CapturePrompt::NameRetry));
                }
                self.apply(CaptureEvent::NameAccepted)?;
                self.draft.name = Some(clean.to_string());
                Ok(StepOutcome::Continue(CapturePrompt::EmailAsk { name: clean.to_string() }))
            }
            CaptureState::AwaitingEmail => {
                if !is_valid_email(clean) {
                    return Ok(StepOutcome::Continue(CapturePrompt::EmailRetry));
                }
                self.apply(CaptureEvent::EmailAccepted)?;
                self.draft.email = Some(clean.to_string());
                Ok(StepOutcome::Continue(CapturePrompt::CompanyAsk))
            }
            CaptureState::AwaitingCompany => {
                self.apply(CaptureEvent::CompanyProvided)?;
                self.draft.company = Some(clean.to_string());
                Ok(StepOutcome::Continue(CapturePrompt::RoleAsk))
            }
            CaptureState::AwaitingRole => {
                self.apply(CaptureEvent::RoleProvided)?;
                self.draft.role = Some(clean.to_string());
                let intent = self.draft.intent.unwrap_or(Intent::Contact);
                Ok(StepOutcome::Continue(CapturePrompt::ContextAsk(intent)))
            }
            CaptureState::AwaitingMessage => {
                self.apply(CaptureEvent::MessageProvided)?;
                self.draft.message = Some(clean.to_string());
                let draft = std::mem::take(&mut self.draft);
                draft
                    .finish()
                    .map(StepOutcome::Complete)
                    .map_err(|missing_fields| CaptureTransitionError::IncompleteDraft {
                        missing_fields,
                    })
            }
            CaptureState::Idle | CaptureState::Complete => Ok(StepOutcome::Inactive),
        }
    }

    /// Back to `Idle` with an empty draft, after a completed or abandoned
    /// capture.
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
        self.draft = LeadDraft::default();
    }

    fn apply(&mut self, event: CaptureEvent) -> Result<TransitionOutcome, CaptureTransitionError> {
        let outcome = transition(self.state, event)?;
        self.state = outcome.to;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        is_valid_email, is_valid_name, transition, CapturePrompt, CaptureTransitionError,
        LeadCapture, StepOutcome,
    };
    use crate::capture::states::{CaptureAction, CaptureEvent, CaptureState};
    use crate::intent::Intent;

    fn started(intent: Intent) -> LeadCapture {
        let mut capture = LeadCapture::default();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).single().expect("valid time");
        let prompt = capture.start(intent, None, now).expect("start is always allowed");
        assert_eq!(prompt, CapturePrompt::Opening(intent));
        capture
    }

    fn step(capture: &mut LeadCapture, text: &str) -> StepOutcome {
        capture.process_step(text).expect("step follows the transition table")
    }

    #[test]
    fn full_flow_yields_complete_record() {
        let mut capture = started(Intent::Schedule);

        assert_eq!(
            step(&mut capture, "Ann"),
            StepOutcome::Continue(CapturePrompt::EmailAsk { name: "Ann".to_string() })
        );
        assert_eq!(step(&mut capture, "ann@example.com"), StepOutcome::Continue(CapturePrompt::CompanyAsk));
        assert_eq!(step(&mut capture, "Acme"), StepOutcome::Continue(CapturePrompt::RoleAsk));
        assert_eq!(
            step(&mut capture, "Engineer"),
            StepOutcome::Continue(CapturePrompt::ContextAsk(Intent::Schedule))
        );

        let record = match step(&mut capture, "Discuss a role") {
            StepOutcome::Complete(record) => record,
            other => panic!("expected completion, got {other:?}"),
        };

        assert_eq!(record.name, "Ann");
        assert_eq!(record.email, "ann@example.com");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.role, "Engineer");
        assert_eq!(record.message, "Discuss a role");
        assert_eq!(record.intent, Intent::Schedule);
        assert_eq!(capture.state(), CaptureState::Complete);
        assert!(!capture.is_collecting());
        assert!(capture.draft().is_empty());
    }

    #[test]
    fn malformed_email_keeps_state_and_draft() {
        let mut capture = started(Intent::Contact);
        step(&mut capture, "Ann");

        assert_eq!(step(&mut capture, "not-an-email"), StepOutcome::Continue(CapturePrompt::EmailRetry));
        assert_eq!(capture.state(), CaptureState::AwaitingEmail);
        assert!(capture.draft().email.is_none());
    }

    #[test]
    fn name_with_digits_or_single_char_is_retried_indefinitely() {
        let mut capture = started(Intent::Learn);

        for attempt in ["A", "R2D2", "  x ", "4"] {
            assert_eq!(step(&mut capture, attempt), StepOutcome::Continue(CapturePrompt::NameRetry));
        }
        assert_eq!(capture.state(), CaptureState::AwaitingName);
        assert!(capture.draft().name.is_none());
    }

    #[test]
    fn name_validation_looks_through_escaped_apostrophes() {
        assert!(is_valid_name("O&#x27;Brien"));
        assert!(!is_valid_name("Ann 2"));
    }

    #[test]
    fn email_shape_matches_basic_addresses_only() {
        assert!(is_valid_email("ann@example.com"));
        assert!(is_valid_email(" a.b@sub.example.co "));
        assert!(!is_valid_email("ann@example"));
        assert!(!is_valid_email("ann example@x.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn context_prompt_follows_draft_intent() {
        let mut capture = started(Intent::Question);
        step(&mut capture, "Bob");
        step(&mut capture, "bob@example.org");
        step(&mut capture, "independent");

        assert_eq!(
            step(&mut capture, "Founder"),
            StepOutcome::Continue(CapturePrompt::ContextAsk(Intent::Question))
        );
    }

    #[test]
    fn idle_machine_does_not_consume_text() {
        let mut capture = LeadCapture::default();

        assert_eq!(step(&mut capture, "hello"), StepOutcome::Inactive);
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn restart_mid_capture_clears_the_draft() {
        let mut capture = started(Intent::Schedule);
        step(&mut capture, "Ann");

        let now = Utc::now();
        capture
            .start(Intent::Contact, Some("LuluBot".to_string()), now)
            .expect("start is always allowed");

        assert_eq!(capture.state(), CaptureState::AwaitingName);
        assert!(capture.draft().name.is_none());
        assert_eq!(capture.draft().intent, Some(Intent::Contact));
        assert_eq!(capture.draft().project_interest.as_deref(), Some("LuluBot"));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut capture = started(Intent::Schedule);
        step(&mut capture, "Ann");

        capture.reset();

        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.draft().is_empty());
    }

    #[test]
    fn table_rejects_out_of_order_events() {
        let error = transition(CaptureState::AwaitingName, CaptureEvent::EmailAccepted)
            .expect_err("email cannot be accepted before the name");

        assert_eq!(
            error,
            CaptureTransitionError::InvalidTransition {
                state: CaptureState::AwaitingName,
                event: CaptureEvent::EmailAccepted,
            }
        );
        assert!(transition(CaptureState::Idle, CaptureEvent::MessageProvided).is_err());
    }

    #[test]
    fn table_emits_lead_on_final_step_and_clears_on_reset() {
        let completed = transition(CaptureState::AwaitingMessage, CaptureEvent::MessageProvided)
            .expect("valid transition");
        assert_eq!(completed.to, CaptureState::Complete);
        assert_eq!(completed.actions, vec![CaptureAction::EmitLead]);

        let reset = transition(CaptureState::AwaitingRole, CaptureEvent::Reset).expect("valid transition");
        assert_eq!(reset.to, CaptureState::Idle);
    }
}
