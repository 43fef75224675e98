//! Model invocation with bounded retries on overload

use std::sync::Arc;
use std::time::Duration;

use super::error::{BlockReason, InferenceError};
use super::gemini::{GenerateContentResponse, GenerateRequest, GenerativeModel, ReadyMedia};
use super::prompts::Prompt;
use super::safety::SafetySetting;
use super::support::sleep::Sleeper;
use crate::ui::prelude::{Level, emit};

pub const MAX_ATTEMPTS: u32 = 3;
/// Backoff grows linearly: 5 s after the first failure, 10 s after the second
pub const BACKOFF_STEP: Duration = Duration::from_secs(5);

pub const MIN_TEMPERATURE: f32 = 0.1;
pub const MAX_TEMPERATURE: f32 = 0.2;

pub fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        return MIN_TEMPERATURE;
    }
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

pub struct InferenceClient {
    model: Arc<dyn GenerativeModel>,
    sleeper: Arc<dyn Sleeper>,
    temperature: f32,
}

impl InferenceClient {
    pub fn new(model: Arc<dyn GenerativeModel>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            model,
            sleeper,
            temperature: MIN_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = clamp_temperature(temperature);
        self
    }

    /// Send one prompt about `media` and return the visible response text.
    pub async fn invoke(
        &self,
        media: &ReadyMedia,
        prompt: &Prompt,
        safety_settings: &[SafetySetting],
    ) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            media: media.handle().clone(),
            system_instruction: prompt.system.clone(),
            user_instruction: prompt.user.clone(),
            safety_settings: safety_settings.to_vec(),
            temperature: self.temperature,
        };

        let mut attempt = 1;
        loop {
            match self.model.generate(&request).await {
                Ok(response) => return extract_text(&response),
                Err(err) if err.is_overloaded() => {
                    if attempt >= MAX_ATTEMPTS {
                        emit(
                            Level::Error,
                            "welt.inference.overloaded",
                            &format!("Model still overloaded after {} attempts", attempt),
                            None,
                        );
                        return Err(InferenceError::Overloaded { attempts: attempt });
                    }
                    let delay = BACKOFF_STEP * attempt;
                    emit(
                        Level::Warn,
                        "welt.inference.retry",
                        &format!(
                            "Model overloaded (attempt {}/{}), retrying in {}s...",
                            attempt,
                            MAX_ATTEMPTS,
                            delay.as_secs()
                        ),
                        None,
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(InferenceError::Fatal(err.to_string())),
            }
        }
    }
}

/// Concatenate the non-thought text parts of the first candidate. A response
/// with no text at all means the provider withheld it.
pub fn extract_text(response: &GenerateContentResponse) -> Result<String, InferenceError> {
    let first = response.candidates.first();

    if let Some(content) = first.and_then(|c| c.content.as_ref()) {
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }

    if let Some(text) = response.text.as_deref().filter(|t| !t.is_empty()) {
        return Ok(text.to_string());
    }

    let reason = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
        .or_else(|| first.and_then(|c| c.finish_reason.as_deref()))
        .map(BlockReason::from_provider)
        .unwrap_or(BlockReason::Unknown);

    Err(InferenceError::Blocked { reason })
}
