use std::time::Duration;

use async_trait::async_trait;
use folio_agent::{AnswerReply, AnswerRequest, AnswerSource, RemoteAnswerError};
use folio_core::config::RemoteConfig;
use reqwest::Client;
use tracing::debug;

/// Answer source backed by the configured HTTP endpoint. With no endpoint
/// every call reports `NotConfigured` and the resolver falls back to canned
/// replies.
#[derive(Clone, Debug)]
pub struct HttpAnswerSource {
    client: Client,
    endpoint: Option<String>,
}

impl HttpAnswerSource {
    pub fn new(config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        let endpoint = config.endpoint.clone().filter(|endpoint| !endpoint.trim().is_empty());
        Ok(Self { client, endpoint })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl AnswerSource for HttpAnswerSource {
    async fn answer(&self, request: AnswerRequest) -> Result<AnswerReply, RemoteAnswerError> {
        let endpoint = self.endpoint.as_deref().ok_or(RemoteAnswerError::NotConfigured)?;

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| RemoteAnswerError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteAnswerError::Status(status.as_u16()));
        }

        let reply: AnswerReply = response
            .json()
            .await
            .map_err(|error| RemoteAnswerError::Decode(error.to_string()))?;
        debug!(
            event_name = "remote.answer.received",
            has_text = reply.text().is_some(),
            history_len = reply.conversation_history.len(),
            "remote answer received"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use folio_agent::{AnswerRequest, AnswerSource, RemoteAnswerError};
    use folio_core::config::RemoteConfig;

    use super::HttpAnswerSource;

    #[tokio::test]
    async fn missing_endpoint_reports_not_configured() {
        let source = HttpAnswerSource::new(&RemoteConfig { endpoint: None, timeout_secs: 5 })
            .expect("client builds");

        let result = source
            .answer(AnswerRequest { message: "hi".to_string(), conversation_history: Vec::new() })
            .await;

        assert!(!source.is_configured());
        assert_eq!(result, Err(RemoteAnswerError::NotConfigured));
    }

    #[test]
    fn blank_endpoint_counts_as_unconfigured() {
        let source = HttpAnswerSource::new(&RemoteConfig {
            endpoint: Some("   ".to_string()),
            timeout_secs: 5,
        })
        .expect("client builds");

        assert!(!source.is_configured());
    }
}
