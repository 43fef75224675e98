//! The four user-facing operations: subtitles, repair, chapters and
//! assistant turns. Each call ingests the video (or reuses a cached upload)
//! before any model request is made.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use super::cache::HandleCache;
use super::chapters::{Chapter, parse_chapter_lines};
use super::config::WeltConfig;
use super::error::{ValidationError, WeltError};
use super::gemini::GeminiClient;
use super::inference::InferenceClient;
use super::ingest::MediaIngestor;
use super::prompts::{DialogueContext, assistant_prompt, chapter_prompt, subtitle_prompt};
use super::router::{AssistantIntent, Diagnostic, Routed, route};
use super::safety::{SafetyPreferences, compile};
use super::srt;
use super::support::sleep::TokioSleeper;
use crate::ui::prelude::{Level, emit};

/// Everything the caller owns for one assistant turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub subtitles: Option<&'a str>,
    pub chapters: &'a [Chapter],
    pub user_text: &'a str,
    pub safety: SafetyPreferences,
}

pub struct Welt {
    ingestor: MediaIngestor,
    inference: InferenceClient,
    subtitle_context_chars: usize,
}

impl Welt {
    pub fn new(ingestor: MediaIngestor, inference: InferenceClient) -> Self {
        Self {
            ingestor,
            inference,
            subtitle_context_chars: WeltConfig::DEFAULT_SUBTITLE_CONTEXT_CHARS,
        }
    }

    pub fn with_subtitle_context_chars(mut self, chars: usize) -> Self {
        self.subtitle_context_chars = chars;
        self
    }

    /// Wire up the Gemini client from configuration. `reuse_uploads` is false
    /// when the caller forces a fresh upload.
    pub fn from_config(config: &WeltConfig, api_key: String, reuse_uploads: bool) -> Result<Self> {
        let mut client = GeminiClient::new(api_key, config.model.clone());
        if let Some(base_url) = &config.base_url {
            client = client.with_base_url(base_url.clone());
        }
        let client = Arc::new(client);
        let sleeper = Arc::new(TokioSleeper);

        let mut ingestor = MediaIngestor::new(client.clone(), sleeper.clone());
        if reuse_uploads && config.reuse_uploads {
            ingestor = ingestor.with_cache(HandleCache::open_default()?);
        }
        let inference =
            InferenceClient::new(client, sleeper).with_temperature(config.temperature());

        Ok(Self::new(ingestor, inference)
            .with_subtitle_context_chars(config.subtitle_context_chars))
    }

    /// Raw model output for a full subtitle track. Run it through
    /// [`repair_subtitles`] before showing or saving it.
    pub async fn generate_subtitles(
        &self,
        video: &Path,
        target_language: &str,
        include_sfx: bool,
        prefs: &SafetyPreferences,
    ) -> Result<String, WeltError> {
        let policy = compile(prefs);
        let prompt = subtitle_prompt(target_language, include_sfx, &policy);
        let media = self.ingestor.ingest(video).await?;
        Ok(self
            .inference
            .invoke(&media, &prompt, &policy.thresholds)
            .await?)
    }

    pub async fn generate_chapters(
        &self,
        video: &Path,
        prefs: &SafetyPreferences,
    ) -> Result<Vec<Chapter>, WeltError> {
        let policy = compile(prefs);
        let media = self.ingestor.ingest(video).await?;
        let text = self
            .inference
            .invoke(&media, &chapter_prompt(), &policy.thresholds)
            .await?;

        let parsed = parse_chapter_lines(&text);
        for line in &parsed.dropped {
            emit(
                Level::Debug,
                "welt.chapters.dropped",
                &format!("Ignoring chapter line without separator: {}", line),
                None,
            );
        }
        Ok(parsed.chapters)
    }

    /// One stateless assistant turn. A proposed patch is validated here, so a
    /// returned [`AssistantIntent::Patch`] always holds a canonical track.
    pub async fn assistant_turn(
        &self,
        video: &Path,
        input: &TurnInput<'_>,
    ) -> Result<Routed, WeltError> {
        let policy = compile(&input.safety);
        let context = DialogueContext {
            subtitles: input.subtitles,
            chapters: input.chapters,
            user_text: input.user_text,
            max_subtitle_chars: self.subtitle_context_chars,
        };
        let prompt = assistant_prompt(&context, &policy);

        let media = self.ingestor.ingest(video).await?;
        let text = self
            .inference
            .invoke(&media, &prompt, &policy.thresholds)
            .await?;

        Ok(check_patch(route(&text)))
    }
}

/// Canonicalize a subtitle track, rejecting anything that is not one.
pub fn repair_subtitles(raw: &str) -> Result<String, ValidationError> {
    Ok(srt::validate(raw)?.to_string())
}

fn check_patch(routed: Routed) -> Routed {
    let Routed {
        intent,
        mut diagnostics,
    } = routed;

    let intent = match intent {
        AssistantIntent::Patch(payload) => match repair_subtitles(&payload) {
            Ok(track) => AssistantIntent::Patch(track),
            Err(err) => {
                diagnostics.push(Diagnostic::PatchRejected(err.to_string()));
                AssistantIntent::Answer(format!(
                    "I tried to update the subtitles, but the new track was invalid: {}",
                    err
                ))
            }
        },
        other => other,
    };

    Routed {
        intent,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::error::{IngestError, InferenceError};
    use crate::video::gemini::MediaState;
    use crate::video::safety::HarmThreshold;
    use crate::video::testing::{FakeModel, FakeStore, RecordingSleeper, overloaded, text_response};

    struct Harness {
        store: Arc<FakeStore>,
        model: Arc<FakeModel>,
        welt: Welt,
    }

    fn harness(store: FakeStore, model: FakeModel) -> Harness {
        let store = Arc::new(store);
        let model = Arc::new(model);
        let sleeper = Arc::new(RecordingSleeper::default());
        let welt = Welt::new(
            MediaIngestor::new(store.clone(), sleeper.clone()),
            InferenceClient::new(model.clone(), sleeper),
        );
        Harness { store, model, welt }
    }

    fn active_store() -> FakeStore {
        FakeStore::with_states(1, Some(MediaState::Active))
    }

    #[tokio::test]
    async fn subtitles_use_the_compiled_policy() {
        let h = harness(
            active_store(),
            FakeModel::replying("1\n00:00:01,000 --> 00:00:02,000\nHola\n"),
        );
        let prefs = SafetyPreferences {
            allow_nsfw: true,
            ..Default::default()
        };

        let raw = h
            .welt
            .generate_subtitles(Path::new("clip.mp4"), "Spanish", false, &prefs)
            .await
            .expect("subtitles");
        assert!(raw.contains("Hola"));

        let request = h.model.last_request().expect("request");
        assert_eq!(request.media.state, MediaState::Active);
        assert_eq!(request.safety_settings, compile(&prefs).thresholds);
        assert!(
            request
                .safety_settings
                .iter()
                .any(|s| s.threshold == HarmThreshold::BlockNone)
        );
        assert!(request.system_instruction.contains("into Spanish"));
    }

    #[tokio::test]
    async fn ingestion_failure_skips_inference() {
        let h = harness(
            FakeStore::with_states(0, Some(MediaState::Failed)),
            FakeModel::replying("never used"),
        );

        let err = h
            .welt
            .generate_subtitles(
                Path::new("clip.mp4"),
                "English",
                false,
                &SafetyPreferences::default(),
            )
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            WeltError::Ingest(IngestError::ProcessingFailed { .. })
        ));
        assert_eq!(h.model.request_count(), 0);
    }

    #[tokio::test]
    async fn overload_surfaces_after_retries() {
        let h = harness(
            active_store(),
            FakeModel::new(vec![Err(overloaded()), Err(overloaded()), Err(overloaded())]),
        );

        let err = h
            .welt
            .generate_chapters(Path::new("clip.mp4"), &SafetyPreferences::default())
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            WeltError::Inference(InferenceError::Overloaded { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn chapters_skip_lines_without_separator() {
        let h = harness(
            active_store(),
            FakeModel::replying("00:00 - Intro\nHere are your chapters\n01:30 - Climax\n"),
        );

        let chapters = h
            .welt
            .generate_chapters(Path::new("clip.mp4"), &SafetyPreferences::default())
            .await
            .expect("chapters");
        assert_eq!(
            chapters,
            vec![Chapter::new("00:00", "Intro"), Chapter::new("01:30", "Climax")]
        );
        assert_eq!(h.store.upload_count(), 1);
    }

    #[tokio::test]
    async fn assistant_patches_come_back_canonical() {
        let h = harness(
            active_store(),
            FakeModel::replying("PATCH:\n```srt\n1\n0:0:1.5 --> 0:0:2\nHi\n```"),
        );
        let chapters = vec![Chapter::new("00:00", "Intro")];
        let input = TurnInput {
            subtitles: Some("1\n00:00:01,000 --> 00:00:02,000\nHello\n"),
            chapters: &chapters,
            user_text: "Translate to something shorter",
            safety: SafetyPreferences::default(),
        };

        let routed = h
            .welt
            .assistant_turn(Path::new("clip.mp4"), &input)
            .await
            .expect("turn");

        assert_eq!(
            routed.intent,
            AssistantIntent::Patch("1\n00:00:01,500 --> 00:00:02,000\nHi\n\n".to_string())
        );
        assert!(routed.diagnostics.is_empty());

        let request = h.model.last_request().expect("request");
        assert!(request.user_instruction.contains("00:00 - Intro"));
        assert!(request.user_instruction.contains("Hello"));
        assert!(request.user_instruction.ends_with("Translate to something shorter"));
    }

    #[tokio::test]
    async fn invalid_patches_degrade_to_answers() {
        let h = harness(active_store(), FakeModel::replying("PATCH: sorry, no timings"));
        let input = TurnInput {
            subtitles: None,
            chapters: &[],
            user_text: "fix it",
            safety: SafetyPreferences::default(),
        };

        let routed = h
            .welt
            .assistant_turn(Path::new("clip.mp4"), &input)
            .await
            .expect("turn");

        assert!(matches!(routed.intent, AssistantIntent::Answer(_)));
        assert_eq!(
            routed.diagnostics,
            vec![Diagnostic::PatchRejected(
                ValidationError::NoTimecodeMarker.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn blocked_turns_are_typed_errors() {
        let mut blocked = text_response("");
        blocked.candidates[0].finish_reason = Some("SAFETY".into());
        let h = harness(active_store(), FakeModel::new(vec![Ok(blocked)]));
        let input = TurnInput {
            subtitles: None,
            chapters: &[],
            user_text: "describe the scene",
            safety: SafetyPreferences::default(),
        };

        let err = h
            .welt
            .assistant_turn(Path::new("clip.mp4"), &input)
            .await
            .expect_err("blocked");
        assert!(matches!(
            err,
            WeltError::Inference(InferenceError::Blocked { .. })
        ));
    }

    #[test]
    fn repair_rejects_non_subtitles() {
        assert_eq!(repair_subtitles("   "), Err(ValidationError::EmptyInput));
        assert_eq!(
            repair_subtitles("just words"),
            Err(ValidationError::NoTimecodeMarker)
        );
    }
}
