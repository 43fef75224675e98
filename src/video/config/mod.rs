use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Import macro from crate root (#[macro_export] places it there)
use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::documented_config;
use crate::video::safety::SafetyPreferences;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeltConfig {
    /// Gemini API key; GEMINI_API_KEY takes precedence
    pub api_key: Option<String>,
    /// Model used for every request
    pub model: String,
    /// Sampling temperature, kept within 0.1-0.2
    pub temperature: f64,
    /// Language subtitles are translated into
    pub target_language: String,
    /// Transcribe sound effects and visual context by default
    pub include_sfx: bool,
    pub allow_nsfw: bool,
    pub allow_gore: bool,
    pub allow_profanity: bool,
    /// Subtitle characters quoted back to the assistant
    pub subtitle_context_chars: usize,
    /// Reuse uploads of identical files while the provider keeps them
    pub reuse_uploads: bool,
    /// Alternative API endpoint, e.g. a proxy
    pub base_url: Option<String>,
}

impl Default for WeltConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            target_language: "English".to_string(),
            include_sfx: false,
            allow_nsfw: false,
            allow_gore: false,
            allow_profanity: false,
            subtitle_context_chars: Self::DEFAULT_SUBTITLE_CONTEXT_CHARS,
            reuse_uploads: true,
            base_url: None,
        }
    }
}

impl WeltConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";
    pub const DEFAULT_TEMPERATURE: f64 = 0.1;
    pub const DEFAULT_SUBTITLE_CONTEXT_CHARS: usize = 30_000;

    pub fn load() -> Result<Self> {
        Self::load_from_path(welt_config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = <Self as DocumentedConfig>::load_from_path_documented(path.as_ref())?;
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        if !self.temperature.is_finite() {
            self.temperature = Self::DEFAULT_TEMPERATURE;
        }
        self.temperature = self.temperature.clamp(0.1, 0.2);
        if self.model.trim().is_empty() {
            self.model = Self::DEFAULT_MODEL.to_string();
        }
        if self.target_language.trim().is_empty() {
            self.target_language = "English".to_string();
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature as f32
    }

    pub fn safety_preferences(&self) -> SafetyPreferences {
        SafetyPreferences {
            allow_nsfw: self.allow_nsfw,
            allow_gore: self.allow_gore,
            allow_profanity: self.allow_profanity,
        }
    }

    /// Pick the API key: explicit flag, then environment, then this file.
    pub fn resolve_api_key(&self, flag: Option<&str>) -> Result<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(flag, from_env.as_deref(), self.api_key.as_deref()).with_context(|| {
            format!(
                "No Gemini API key found. Pass --api-key, set {} or add api_key to {}",
                API_KEY_ENV,
                welt_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "welt.toml".to_string())
            )
        })
    }
}

fn pick_api_key(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
}

documented_config!(WeltConfig {
    fields: [
        model, "Gemini model used for every request",
        temperature, "Sampling temperature (kept within 0.1-0.2)",
        target_language, "Language subtitles are translated into",
        include_sfx, "Transcribe sound effects and visual context",
        allow_nsfw, "Allow sexual content instead of blocking it",
        allow_gore, "Allow graphic violence instead of blocking it",
        allow_profanity, "Keep profanity instead of censoring it",
        subtitle_context_chars, "Subtitle characters quoted back to the assistant",
        reuse_uploads, "Reuse uploads of identical files for up to 46 hours",
    ],
    optional: [
        api_key, "Gemini API key (GEMINI_API_KEY takes precedence)",
        base_url, "Alternative API endpoint",
    ],
    config_path: welt_config_path(),
});

fn welt_config_path() -> Result<PathBuf> {
    Ok(paths::welt_config_dir()?.join("welt.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_config_is_written_with_documentation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("welt.toml");

        let config = WeltConfig::load_from_path(&path).expect("load");
        assert_eq!(config, WeltConfig::default());

        let written = fs::read_to_string(&path).expect("config written");
        assert!(written.contains("model = \"gemini-2.5-flash\""));
        assert!(written.contains("# api_key = \"\""));
        assert!(written.contains("Keep profanity instead of censoring it"));

        // The documented file parses back to the same config
        assert_eq!(WeltConfig::load_from_path(&path).expect("reload"), config);
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("welt.toml");
        fs::write(&path, "temperature = 0.9\nmodel = \"\"\nallow_gore = true\n").expect("write");

        let config = WeltConfig::load_from_path(&path).expect("load");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.model, WeltConfig::DEFAULT_MODEL);
        assert!(config.safety_preferences().allow_gore);
        assert!(!config.safety_preferences().allow_nsfw);
    }

    #[test]
    fn api_key_precedence() {
        assert_eq!(
            pick_api_key(Some("flag"), Some("env"), Some("file")).as_deref(),
            Some("flag")
        );
        assert_eq!(
            pick_api_key(None, Some("env"), Some("file")).as_deref(),
            Some("env")
        );
        assert_eq!(
            pick_api_key(Some("  "), None, Some("file")).as_deref(),
            Some("file")
        );
        assert_eq!(pick_api_key(None, None, None), None);
    }
}
