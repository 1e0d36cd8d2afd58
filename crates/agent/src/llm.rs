use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Body sent to the remote answer service. History entries are opaque to
/// this crate; whatever the service returned last time is sent back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub message: String,
    pub conversation_history: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<Value>,
}

impl AnswerReply {
    /// The reply text, if the service produced a non-blank one.
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.trim().is_empty())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteAnswerError {
    #[error("no remote answer endpoint is configured")]
    NotConfigured,
    #[error("remote answer transport failed: {0}")]
    Transport(String),
    #[error("remote answer service returned status {0}")]
    Status(u16),
    #[error("remote answer payload could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn answer(&self, request: AnswerRequest) -> Result<AnswerReply, RemoteAnswerError>;
}

/// Used when no endpoint is configured; every message takes the canned path.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableAnswerSource;

#[async_trait]
impl AnswerSource for UnavailableAnswerSource {
    async fn answer(&self, _request: AnswerRequest) -> Result<AnswerReply, RemoteAnswerError> {
        Err(RemoteAnswerError::NotConfigured)
    }
}
