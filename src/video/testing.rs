//! In-memory stand-ins for the remote services

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::gemini::types::{Candidate, Content, Part};
use super::gemini::{
    GenerateContentResponse, GenerateRequest, GenerativeModel, MediaHandle, MediaState,
    MediaStore, TransportError,
};
use super::support::sleep::Sleeper;

pub fn handle(name: &str, state: MediaState) -> MediaHandle {
    MediaHandle {
        name: name.to_string(),
        uri: format!("https://example.test/{}", name),
        mime_type: "video/mp4".to_string(),
        state,
    }
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content {
                parts: vec![Part {
                    text: Some(text.to_string()),
                    thought: false,
                }],
            }),
            finish_reason: Some("STOP".to_string()),
        }],
        ..Default::default()
    }
}

pub fn overloaded() -> TransportError {
    TransportError::new(Some(503), "The model is overloaded. Please try again later.")
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps lock").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeps lock").push(duration);
    }
}

/// Uploads always succeed (unless told otherwise); status checks replay a
/// script and then keep reporting PROCESSING.
pub struct FakeStore {
    upload_result: Mutex<Result<MediaHandle, TransportError>>,
    statuses: Mutex<VecDeque<Result<MediaHandle, TransportError>>>,
    pub uploads: AtomicUsize,
    pub status_checks: AtomicUsize,
}

impl FakeStore {
    pub fn new(statuses: Vec<Result<MediaHandle, TransportError>>) -> Self {
        Self {
            upload_result: Mutex::new(Ok(handle("files/video", MediaState::Processing))),
            statuses: Mutex::new(statuses.into()),
            uploads: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
        }
    }

    /// `processing` PROCESSING reports followed by one report of `last`
    pub fn with_states(processing: usize, last: Option<MediaState>) -> Self {
        let mut statuses: Vec<_> = (0..processing)
            .map(|_| Ok(handle("files/video", MediaState::Processing)))
            .collect();
        if let Some(state) = last {
            statuses.push(Ok(handle("files/video", state)));
        }
        Self::new(statuses)
    }

    pub fn failing_upload(self, err: TransportError) -> Self {
        *self.upload_result.lock().expect("upload lock") = Err(err);
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for FakeStore {
    async fn upload(&self, _path: &Path) -> Result<MediaHandle, TransportError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.upload_result.lock().expect("upload lock").clone()
    }

    async fn status(&self, name: &str) -> Result<MediaHandle, TransportError> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .expect("status lock")
            .pop_front()
            .unwrap_or_else(|| Ok(handle(name, MediaState::Processing)))
    }
}

/// Replays scripted replies and records every request it receives.
pub struct FakeModel {
    replies: Mutex<VecDeque<Result<GenerateContentResponse, TransportError>>>,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeModel {
    pub fn new(replies: Vec<Result<GenerateContentResponse, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text_response(text))])
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().expect("requests lock").last().cloned()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new(Some(500), "no scripted reply left")))
    }
}
