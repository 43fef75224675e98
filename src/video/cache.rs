//! On-disk cache of uploaded media handles
//!
//! Entries live at `<cache>/<content-hash>/handle.json`. The provider deletes
//! uploads after 48 hours, so entries older than [`DEFAULT_MAX_AGE_HOURS`] are
//! discarded on lookup. Callers also invalidate an entry whenever the remote
//! file turns out not to be ACTIVE.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::gemini::{MediaHandle, MediaState};
use super::support::utils::compute_file_hash;
use crate::common::paths;

pub const DEFAULT_MAX_AGE_HOURS: i64 = 46;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedHandle {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

pub struct HandleCache {
    root: PathBuf,
    max_age: Duration,
}

impl HandleCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_age: Duration::hours(DEFAULT_MAX_AGE_HOURS),
        }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(paths::welt_cache_dir()?))
    }

    pub fn key_for(&self, video: &Path) -> Result<String> {
        compute_file_hash(video)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key).join("handle.json")
    }

    pub fn lookup(&self, key: &str) -> Result<Option<CachedHandle>> {
        self.lookup_at(key, Utc::now())
    }

    pub fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CachedHandle>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading cached handle {}", path.display()))?;
        let entry: CachedHandle = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(_) => {
                // Unreadable entries are as good as missing
                self.invalidate(key)?;
                return Ok(None);
            }
        };

        if now - entry.uploaded_at > self.max_age {
            self.invalidate(key)?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    pub fn store(&self, key: &str, handle: &MediaHandle) -> Result<()> {
        self.store_at(key, handle, Utc::now())
    }

    pub fn store_at(&self, key: &str, handle: &MediaHandle, now: DateTime<Utc>) -> Result<()> {
        let path = self.entry_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }

        let entry = CachedHandle {
            name: handle.name.clone(),
            uri: handle.uri.clone(),
            mime_type: handle.mime_type.clone(),
            uploaded_at: now,
        };
        let json = serde_json::to_string_pretty(&entry).context("serializing cached handle")?;
        fs::write(&path, json).with_context(|| format!("writing cached handle {}", path.display()))
    }

    pub fn invalidate(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("removing cached handle {}", path.display()))?;
        }
        Ok(())
    }
}
