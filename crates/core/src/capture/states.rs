use serde::{Deserialize, Serialize};

use crate::intent::Intent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    AwaitingName,
    AwaitingEmail,
    AwaitingCompany,
    AwaitingRole,
    AwaitingMessage,
    Complete,
}

impl CaptureState {
    /// `Idle` and `Complete` both mean "not collecting".
    pub fn is_collecting(self) -> bool {
        !matches!(self, Self::Idle | Self::Complete)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureEvent {
    Started(Intent),
    NameAccepted,
    EmailAccepted,
    CompanyProvided,
    RoleProvided,
    MessageProvided,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureAction {
    ClearDraft,
    StampIntent,
    PromptForName,
    PromptForEmail,
    PromptForCompany,
    PromptForRole,
    PromptForContext,
    EmitLead,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: CaptureState,
    pub to: CaptureState,
    pub event: CaptureEvent,
    pub actions: Vec<CaptureAction>,
}
