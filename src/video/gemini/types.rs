//! Wire types and service seams for the remote model provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::video::safety::SafetySetting;

/// Lifecycle of an uploaded file on the provider side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaState {
    Uploading,
    Processing,
    Active,
    Failed,
    /// STATE_UNSPECIFIED or anything newer than this client
    #[serde(other)]
    Unknown,
}

/// A file resource as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaHandle {
    /// Resource name, e.g. "files/abc123"
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default = "MediaHandle::unknown_state")]
    pub state: MediaState,
}

impl MediaHandle {
    fn unknown_state() -> MediaState {
        MediaState::Unknown
    }
}

/// A handle that has been observed ACTIVE. Only ingestion creates these, so
/// a model request can never reference media that is still processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyMedia(MediaHandle);

impl ReadyMedia {
    pub(crate) fn new(handle: MediaHandle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> &MediaHandle {
        &self.0
    }
}

/// One model request, independent of wire format
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub media: MediaHandle,
    pub system_instruction: String,
    pub user_instruction: String,
    pub safety_settings: Vec<SafetySetting>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    /// Flattened text some SDKs and proxies add next to the candidates
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Part {
    pub text: Option<String>,
    /// Set on reasoning parts, which are never shown to users
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// A failed exchange with the provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status when the provider answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Transient capacity problems are the only retryable failures
    pub fn is_overloaded(&self) -> bool {
        self.status == Some(503) || self.message.to_lowercase().contains("overloaded")
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// Remote media ingestion: upload a file, then ask for its state
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<MediaHandle, TransportError>;

    async fn status(&self, name: &str) -> Result<MediaHandle, TransportError>;
}

/// Remote multimodal generation
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateContentResponse, TransportError>;
}
