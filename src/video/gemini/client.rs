//! Gemini REST API client
//!
//! Uses the resumable upload protocol for media and `generateContent` for
//! inference. Errors are reported as [`TransportError`] so callers can decide
//! what is retryable.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use super::types::{
    GenerateContentResponse, GenerateRequest, GenerativeModel, MediaHandle, MediaStore,
    TransportError,
};
use crate::ui::prelude::{Level, emit};
use crate::video::support::utils::mime_type_for;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: MediaHandle,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Turn a non-2xx response into a transport error with the provider's message
    async fn error_from(resp: reqwest::Response, context: &str) -> TransportError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) if !envelope.error.status.is_empty() => {
                format!("{} ({}): {}", context, envelope.error.status, envelope.error.message)
            }
            Ok(envelope) => format!("{} ({}): {}", context, status, envelope.error.message),
            Err(_) => format!("{} ({}): {}", context, status, text),
        };
        TransportError::new(Some(status.as_u16()), message)
    }
}

#[async_trait]
impl MediaStore for GeminiClient {
    async fn upload(&self, path: &Path) -> Result<MediaHandle, TransportError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            TransportError::new(None, format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mime_type = mime_type_for(path);
        let display_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        emit(
            Level::Info,
            "welt.gemini.upload",
            &format!("Uploading {} ({} bytes)...", path.display(), bytes.len()),
            None,
        );

        // Step 1: open a resumable upload session
        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;

        if !start.status().is_success() {
            return Err(Self::error_from(start, "Failed to start upload").await);
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TransportError::new(None, "Upload session has no upload URL"))?;

        // Step 2: send the bytes and finalize in one request
        let resp = self
            .client
            .post(&upload_url)
            .header(CONTENT_LENGTH, bytes.len().to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, "Failed to upload video").await);
        }

        let envelope: FileEnvelope = resp.json().await?;
        emit(
            Level::Debug,
            "welt.gemini.uploaded",
            &format!("Uploaded as {} ({:?})", envelope.file.name, envelope.file.state),
            None,
        );
        Ok(envelope.file)
    }

    async fn status(&self, name: &str) -> Result<MediaHandle, TransportError> {
        let resp = self
            .client
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, "Failed to check file status").await);
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "fileData": {
                            "mimeType": request.media.mime_type,
                            "fileUri": request.media.uri,
                        }
                    },
                    { "text": request.user_instruction }
                ]
            }],
            "safetySettings": request.safety_settings,
            "generationConfig": { "temperature": request.temperature },
        });

        let resp = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp, "Generation failed").await);
        }

        Ok(resp.json().await?)
    }
}
