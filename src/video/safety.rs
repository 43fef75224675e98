//! Content policy: provider filter thresholds plus prompt directives
//!
//! Both halves are derived from the same three switches so the provider's
//! filters and the model's instructions never disagree.

use serde::{Deserialize, Serialize};

/// User switches for mature content. Everything defaults to the most
/// restrictive posture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPreferences {
    pub allow_nsfw: bool,
    pub allow_gore: bool,
    pub allow_profanity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmThreshold {
    BlockLowAndAbove,
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmThreshold,
}

/// Compiled policy for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    pub thresholds: Vec<SafetySetting>,
    pub directives: Vec<String>,
}

const STRICT: HarmThreshold = HarmThreshold::BlockLowAndAbove;
const PERMISSIVE: HarmThreshold = HarmThreshold::BlockNone;

/// Map preferences to thresholds and directives. Pure and total.
pub fn compile(prefs: &SafetyPreferences) -> SafetyPolicy {
    let violent = if prefs.allow_gore { PERMISSIVE } else { STRICT };
    let sexual = if prefs.allow_nsfw { PERMISSIVE } else { STRICT };

    let thresholds = vec![
        SafetySetting {
            category: HarmCategory::Harassment,
            threshold: violent,
        },
        SafetySetting {
            category: HarmCategory::HateSpeech,
            threshold: STRICT,
        },
        SafetySetting {
            category: HarmCategory::SexuallyExplicit,
            threshold: sexual,
        },
        SafetySetting {
            category: HarmCategory::DangerousContent,
            threshold: violent,
        },
    ];

    let violence_directive = if prefs.allow_gore {
        "Violence and gore: ALLOWED. Describe violent, bloody or dangerous events objectively and accurately when they matter to the scene."
    } else {
        "Violence and gore: RESTRICTED. Strictly filter graphic violence and gore; refer to such events only in neutral, non-graphic terms."
    };

    let sexual_directive = if prefs.allow_nsfw {
        "Mature themes: ALLOWED. Sexual or mature content may be transcribed and described when it is relevant to the narrative."
    } else {
        "Mature themes: RESTRICTED. Do not describe or transcribe sexual content; omit it or summarize it as [mature content]."
    };

    let profanity_directive = if prefs.allow_profanity {
        "Profanity: ALLOWED. Transcribe swear words verbatim and uncensored."
    } else {
        "Profanity: CENSORED. Mask swear words by keeping the first and last letter and replacing every letter in between with '*' (for example 'f**k', 's**t')."
    };

    SafetyPolicy {
        thresholds,
        directives: vec![
            violence_directive.to_string(),
            sexual_directive.to_string(),
            profanity_directive.to_string(),
        ],
    }
}
