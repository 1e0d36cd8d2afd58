use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::Intent;

pub const LEAD_SOURCE: &str = "portfolio_chatbot";

/// A completed lead, handed by value to the notification sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub intent: Intent,
    pub project_interest: Option<String>,
    pub message: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub source: String,
}

/// Working draft owned by the capture state machine while a lead is being
/// collected. Each field is written once, in capture order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeadDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub intent: Option<Intent>,
    pub project_interest: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl LeadDraft {
    pub fn started(
        intent: Intent,
        project_interest: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            intent: Some(intent),
            project_interest,
            created_at: Some(created_at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.email.is_none() {
            missing.push("email");
        }
        if self.company.is_none() {
            missing.push("company");
        }
        if self.role.is_none() {
            missing.push("role");
        }
        if self.intent.is_none() {
            missing.push("intent");
        }
        if self.message.is_none() {
            missing.push("message");
        }
        if self.created_at.is_none() {
            missing.push("created_at");
        }
        missing
    }

    /// Freezes the draft into a record. Returns the list of unset fields
    /// when the draft is incomplete.
    pub fn finish(&self) -> Result<LeadRecord, Vec<&'static str>> {
        match (
            &self.name,
            &self.email,
            &self.company,
            &self.role,
            self.intent,
            &self.message,
            self.created_at,
        ) {
            (
                Some(name),
                Some(email),
                Some(company),
                Some(role),
                Some(intent),
                Some(message),
                Some(created_at),
            ) => Ok(LeadRecord {
                name: name.clone(),
                email: email.clone(),
                company: company.clone(),
                role: role.clone(),
                intent,
                project_interest: self.project_interest.clone(),
                message: message.clone(),
                created_at,
                source: LEAD_SOURCE.to_string(),
            }),
            _ => Err(self.missing_fields()),
        }
    }
}
