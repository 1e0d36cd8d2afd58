use async_trait::async_trait;
use folio_agent::{EmailTemplateParams, NotificationError, NotificationSink};
use folio_core::config::AppConfig;
use folio_core::domain::lead::LeadRecord;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone, Debug)]
struct EmailTransport {
    api_url: String,
    service_id: String,
    template_id: String,
    public_key: SecretString,
}

/// Body accepted by the e-mail delivery service.
#[derive(Debug, Serialize)]
pub struct EmailSendRequest<'a> {
    pub service_id: &'a str,
    pub template_id: &'a str,
    pub user_id: &'a str,
    pub template_params: EmailTemplateParams,
}

/// Delivers leads to the e-mail service and the spreadsheet webhook, each
/// only when configured.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
    owner_email: String,
    email: Option<EmailTransport>,
    sheets_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &AppConfig, client: Client) -> Self {
        let email = config.email.enabled.then(|| EmailTransport {
            api_url: config.email.api_url.clone(),
            service_id: config.email.service_id.clone(),
            template_id: config.email.template_id.clone(),
            public_key: config.email.public_key.clone(),
        });
        let sheets_url = config.sheets.webhook_url.clone().filter(|_| config.sheets.is_configured());

        Self { client, owner_email: config.owner.email.clone(), email, sheets_url }
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub fn sheets_enabled(&self) -> bool {
        self.sheets_url.is_some()
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn send_email(&self, lead: &LeadRecord) -> Result<(), NotificationError> {
        let transport = self.email.as_ref().ok_or(NotificationError::NotConfigured("email"))?;
        let body = EmailSendRequest {
            service_id: &transport.service_id,
            template_id: &transport.template_id,
            user_id: transport.public_key.expose_secret(),
            template_params: EmailTemplateParams::from_lead(lead, &self.owner_email),
        };

        let response = self
            .client
            .post(&transport.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|error| NotificationError::Transport {
                channel: "email",
                message: error.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(NotificationError::Status {
                channel: "email",
                status: response.status().as_u16(),
            });
        }

        debug!(event_name = "notify.email.sent", intent = %lead.intent, "lead e-mail sent");
        Ok(())
    }

    async fn log_lead(&self, lead: &LeadRecord) -> Result<(), NotificationError> {
        let Some(url) = self.sheets_url.as_deref() else {
            info!(
                event_name = "notify.sheets.skipped",
                intent = %lead.intent,
                "sheets webhook not configured; lead kept in log only"
            );
            return Ok(());
        };

        let response = self.client.post(url).json(lead).send().await.map_err(|error| {
            NotificationError::Transport { channel: "sheets", message: error.to_string() }
        })?;
        if !response.status().is_success() {
            return Err(NotificationError::Status {
                channel: "sheets",
                status: response.status().as_u16(),
            });
        }

        debug!(event_name = "notify.sheets.logged", intent = %lead.intent, "lead logged to sheet");
        Ok(())
    }
}
