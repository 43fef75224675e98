//! Upload a video and wait for the provider to finish processing it

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::cache::HandleCache;
use super::error::IngestError;
use super::gemini::{MediaHandle, MediaState, MediaStore, ReadyMedia};
use super::support::sleep::Sleeper;
use crate::ui::prelude::{Level, emit};

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// 150 polls at 2 s is roughly five minutes
pub const MAX_POLLS: u32 = 150;

pub struct MediaIngestor {
    store: Arc<dyn MediaStore>,
    sleeper: Arc<dyn Sleeper>,
    cache: Option<HandleCache>,
}

impl MediaIngestor {
    pub fn new(store: Arc<dyn MediaStore>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            store,
            sleeper,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: HandleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Produce an ACTIVE handle for `video`, reusing a cached upload when the
    /// provider still has it.
    pub async fn ingest(&self, video: &Path) -> Result<ReadyMedia, IngestError> {
        let Some(cache) = &self.cache else {
            return self.upload_and_wait(video).await;
        };

        let key = match cache.key_for(video) {
            Ok(key) => key,
            Err(err) => {
                emit(
                    Level::Warn,
                    "welt.ingest.cache",
                    &format!("Could not fingerprint {}: {:#}", video.display(), err),
                    None,
                );
                return self.upload_and_wait(video).await;
            }
        };

        if let Some(ready) = self.reuse_cached(cache, &key).await {
            return Ok(ready);
        }

        let result = self.upload_and_wait(video).await;
        let outcome = match &result {
            Ok(ready) => cache.store(&key, ready.handle()),
            Err(_) => cache.invalidate(&key),
        };
        if let Err(err) = outcome {
            emit(
                Level::Warn,
                "welt.ingest.cache",
                &format!("Failed to update the upload cache: {:#}", err),
                None,
            );
        }
        result
    }

    async fn reuse_cached(&self, cache: &HandleCache, key: &str) -> Option<ReadyMedia> {
        let entry = match cache.lookup(key) {
            Ok(entry) => entry?,
            Err(err) => {
                emit(
                    Level::Warn,
                    "welt.ingest.cache",
                    &format!("Ignoring unreadable upload cache: {:#}", err),
                    None,
                );
                return None;
            }
        };

        match self.store.status(&entry.name).await {
            Ok(handle) if handle.state == MediaState::Active => {
                emit(
                    Level::Info,
                    "welt.ingest.cached",
                    &format!("Reusing uploaded video {}", handle.name),
                    None,
                );
                let mut handle = handle;
                if handle.uri.is_empty() {
                    handle.uri = entry.uri.clone();
                }
                if handle.mime_type.is_empty() {
                    handle.mime_type = entry.mime_type.clone();
                }
                Some(ReadyMedia::new(handle))
            }
            Ok(_) | Err(_) => {
                emit(
                    Level::Debug,
                    "welt.ingest.cache",
                    &format!("Cached upload {} is no longer usable", entry.name),
                    None,
                );
                if let Err(err) = cache.invalidate(key) {
                    emit(
                        Level::Warn,
                        "welt.ingest.cache",
                        &format!("Failed to update the upload cache: {:#}", err),
                        None,
                    );
                }
                None
            }
        }
    }

    async fn upload_and_wait(&self, video: &Path) -> Result<ReadyMedia, IngestError> {
        let uploaded = self
            .store
            .upload(video)
            .await
            .map_err(|e| IngestError::Upload(e.to_string()))?;
        self.wait_until_active(uploaded).await
    }

    async fn wait_until_active(&self, uploaded: MediaHandle) -> Result<ReadyMedia, IngestError> {
        match uploaded.state {
            MediaState::Active => return Ok(ReadyMedia::new(uploaded)),
            MediaState::Failed => {
                return Err(IngestError::ProcessingFailed {
                    name: uploaded.name,
                });
            }
            _ => {}
        }

        emit(
            Level::Info,
            "welt.ingest.processing",
            "Waiting for the video to finish processing...",
            None,
        );

        for poll in 1..=MAX_POLLS {
            self.sleeper.sleep(POLL_INTERVAL).await;

            let handle = match self.store.status(&uploaded.name).await {
                Ok(handle) => handle,
                Err(err) => {
                    emit(
                        Level::Warn,
                        "welt.ingest.poll",
                        &format!("Status check {} failed: {}", poll, err),
                        None,
                    );
                    continue;
                }
            };

            emit(
                Level::Debug,
                "welt.ingest.poll",
                &format!("Status check {}: {:?}", poll, handle.state),
                None,
            );

            match handle.state {
                MediaState::Active => {
                    let mut handle = handle;
                    if handle.uri.is_empty() {
                        handle.uri = uploaded.uri.clone();
                    }
                    if handle.mime_type.is_empty() {
                        handle.mime_type = uploaded.mime_type.clone();
                    }
                    return Ok(ReadyMedia::new(handle));
                }
                MediaState::Failed => {
                    return Err(IngestError::ProcessingFailed { name: handle.name });
                }
                _ => {}
            }
        }

        Err(IngestError::ProcessingTimeout { polls: MAX_POLLS })
    }
}
