use std::sync::Arc;
use std::time::Duration;

use folio_agent::ChatRuntime;
use folio_core::audit::TracingAuditSink;
use folio_core::config::{AppConfig, ConfigError, LoadOptions};
use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::notify::WebhookNotifier;
use crate::remote::HttpAnswerSource;

pub type FolioRuntime = ChatRuntime<HttpAnswerSource, WebhookNotifier>;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<FolioRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let answers = HttpAnswerSource::new(&config.remote).map_err(BootstrapError::HttpClient)?;
    let client = Client::builder()
        .timeout(Duration::from_secs(config.remote.timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)?;
    let notifier = WebhookNotifier::new(&config, client);

    info!(
        event_name = "system.bootstrap.integrations",
        correlation_id = "bootstrap",
        remote = answers.is_configured(),
        email = notifier.email_enabled(),
        sheets = notifier.sheets_enabled(),
        "integrations resolved"
    );

    let runtime = ChatRuntime::new(&config, answers, notifier, Arc::new(TracingAuditSink));
    Ok(Application { config, runtime: Arc::new(runtime) })
}
