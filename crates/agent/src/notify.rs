use async_trait::async_trait;
use folio_core::domain::lead::LeadRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("{0} delivery is not configured")]
    NotConfigured(&'static str),
    #[error("{channel} transport failed: {message}")]
    Transport { channel: &'static str, message: String },
    #[error("{channel} endpoint returned status {status}")]
    Status { channel: &'static str, status: u16 },
}

/// Delivery of completed leads. Both calls are best-effort: the runtime
/// logs failures and still confirms the capture to the visitor.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_email(&self, lead: &LeadRecord) -> Result<(), NotificationError>;

    /// Spreadsheet logging. Implementations without a configured endpoint
    /// return `Ok(())`.
    async fn log_lead(&self, lead: &LeadRecord) -> Result<(), NotificationError>;
}

/// Named fields of the lead notification e-mail template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplateParams {
    pub to_email: String,
    pub from_name: String,
    pub from_email: String,
    pub company: String,
    pub role: String,
    pub intent: String,
    pub message: String,
    pub project_interest: String,
    pub timestamp: String,
    pub reply_to: String,
}

impl EmailTemplateParams {
    pub fn from_lead(lead: &LeadRecord, owner_email: &str) -> Self {
        Self {
            to_email: owner_email.to_string(),
            from_name: lead.name.clone(),
            from_email: lead.email.clone(),
            company: or_default(&lead.company, "Not provided"),
            role: or_default(&lead.role, "Not provided"),
            intent: lead.intent.as_str().to_string(),
            message: or_default(&lead.message, "No message"),
            project_interest: lead
                .project_interest
                .as_deref()
                .map(|value| or_default(value, "General"))
                .unwrap_or_else(|| "General".to_string()),
            timestamp: lead.created_at.format("%-m/%-d/%Y, %-I:%M:%S %p UTC").to_string(),
            reply_to: lead.email.clone(),
        }
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Sink for runs without any delivery transport: leads only reach the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogOnlySink;

#[async_trait]
impl NotificationSink for LogOnlySink {
    async fn send_email(&self, _lead: &LeadRecord) -> Result<(), NotificationError> {
        Err(NotificationError::NotConfigured("email"))
    }

    async fn log_lead(&self, lead: &LeadRecord) -> Result<(), NotificationError> {
        info!(
            event_name = "notify.sheets.skipped",
            intent = %lead.intent,
            source = %lead.source,
            "sheets webhook not configured; lead kept in log only"
        );
        Ok(())
    }
}
