//! Instruction assembly for the three model-facing operations

use super::chapters::{Chapter, format_chapters};
use super::router::{ANSWER_PREFIX, CHAPTERS_PREFIX, PATCH_PREFIX, SEEK_PREFIX};
use super::safety::SafetyPolicy;

const NO_CHAPTERS: &str = "(No chapters yet.)";
const NO_SUBTITLES: &str = "(No subtitles generated yet.)";
const TRUNCATION_NOTE: &str = "\n[... subtitle track truncated ...]";

/// A system/user instruction pair for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Conversation state the caller hands in for one assistant turn.
#[derive(Debug, Clone, Copy)]
pub struct DialogueContext<'a> {
    pub subtitles: Option<&'a str>,
    pub chapters: &'a [Chapter],
    pub user_text: &'a str,
    /// Upper bound on subtitle characters quoted back to the model
    pub max_subtitle_chars: usize,
}

fn directive_block(policy: &SafetyPolicy) -> String {
    policy
        .directives
        .iter()
        .map(|d| format!("   - {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}

fn sfx_instruction(include_sfx: bool) -> &'static str {
    if include_sfx {
        "Context Mode: ON. You MUST transcribe significant non-speech sounds and visual context in square brackets, \
         for example [Laughs], [Doorbell rings], [Upbeat music plays], [Sign reads: 'Danger']. \
         Integrate these naturally with the dialogue."
    } else {
        "Context Mode: OFF. Do NOT subtitle sound effects, music or visual context. Transcribe spoken dialogue ONLY."
    }
}

pub fn subtitle_prompt(target_language: &str, include_sfx: bool, policy: &SafetyPolicy) -> Prompt {
    let system = format!(
        "You are an expert context-aware subtitler.\n\
         \n\
         DEFINITIONS:\n\
         - Alpha Language: the single most dominant spoken language in the video.\n\
         - Foreign Language: any spoken language that is NOT the Alpha Language.\n\
         \n\
         RULES:\n\
         1. Source: IGNORE any subtitles or captions burned into the video. Generate subtitles only from what is heard and seen.\n\
         2. Content policy:\n{directives}\n\
         3. Alpha tagging:\n\
            - Listen to the full video and determine the Alpha Language.\n\
            - A line spoken in the Alpha Language is output as plain translated text, with NO tag.\n\
            - A line spoken in a Foreign Language is translated, prefixed with the language name in parentheses and wrapped in <i></i>.\n\
            - Example (Alpha=English, Target=English): Audio (English) \"Hello.\" -> \"Hello.\"; Audio (Spanish) \"Hola.\" -> \"<i>(Spanish) Hello.</i>\"\n\
         4. Sound effects: {sfx}\n\
         5. Translation: translate ALL content into {language}.\n\
         6. Format: return exactly ONE valid SRT document (numbered cues, 'HH:MM:SS,mmm --> HH:MM:SS,mmm' timing lines). \
         No markdown fences, no commentary, no text before or after the subtitles.",
        directives = directive_block(policy),
        sfx = sfx_instruction(include_sfx),
        language = target_language,
    );

    let user = format!(
        "Video processed.\n\
         Target output language: {language}.\n\
         Include sound effects (SDH): {sfx}.\n\
         \n\
         Task:\n\
         1. Identify the Alpha Language.\n\
         2. Generate synchronized SRT subtitles in {language}.\n\
         3. STRICTLY apply the Alpha tagging rule.\n\
         4. Apply the sound effect and content policy rules defined above.",
        language = target_language,
        sfx = include_sfx,
    );

    Prompt { system, user }
}

pub fn chapter_prompt() -> Prompt {
    Prompt {
        system: "You are a precise video editor who writes chapter markers.".to_string(),
        user: "Analyze the entire video and list its chapters, one per line, in the exact format \
               'MM:SS - Title' (use 'H:MM:SS - Title' past the first hour). The first chapter MUST start at 00:00. \
               Create a new chapter at every major scene or topic transition. Titles must be short: 2 to 4 words. \
               Output only the chapter lines, nothing else."
            .to_string(),
    }
}

/// Quote at most `max_chars` characters of the current track.
fn subtitle_excerpt(subtitles: Option<&str>, max_chars: usize) -> String {
    let Some(text) = subtitles.map(str::trim).filter(|t| !t.is_empty()) else {
        return NO_SUBTITLES.to_string();
    };

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_NOTE),
        None => text.to_string(),
    }
}

pub fn assistant_prompt(context: &DialogueContext<'_>, policy: &SafetyPolicy) -> Prompt {
    let system = format!(
        "You are Welt, a video subtitle assistant. You can see the video and the user's current subtitles and chapters.\n\
         \n\
         Content policy:\n{directives}\n\
         \n\
         Reply with EXACTLY ONE of the following, starting at the very first character of your reply:\n\
         1. {patch} followed by the COMPLETE corrected SRT track, when the user asks to change, fix, translate or retime subtitles.\n\
         2. {chapters} followed by the complete chapter list, one 'MM:SS - Title' per line, when the user asks to change chapters.\n\
         3. {seek} followed by a timestamp (MM:SS or H:MM:SS) and a short description, when the user asks to go to or find a single moment. \
         Example: '{seek}12:34 The door opens'.\n\
         4. For requests to scan the whole video for something, reply '<NAME> FOUND IN VIDEO (<N>) TIMES: <MM:SS>, <MM:SS>, ...' \
         or '<NAME> NOT FOUND IN VIDEO.' with NAME in capital letters.\n\
         5. {answer} followed by a concise answer, for every other question.\n\
         Never wrap the reply in markdown fences.",
        directives = directive_block(policy),
        patch = PATCH_PREFIX,
        chapters = CHAPTERS_PREFIX,
        seek = SEEK_PREFIX,
        answer = ANSWER_PREFIX,
    );

    let chapters = if context.chapters.is_empty() {
        NO_CHAPTERS.to_string()
    } else {
        format_chapters(context.chapters).trim_end().to_string()
    };

    let user = format!(
        "CURRENT CHAPTERS:\n{}\n\nCURRENT SUBTITLES:\n{}\n\nUSER INSTRUCTION:\n{}",
        chapters,
        subtitle_excerpt(context.subtitles, context.max_subtitle_chars),
        context.user_text,
    );

    Prompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::safety::{SafetyPreferences, compile};

    #[test]
    fn subtitle_prompt_carries_every_rule() {
        let policy = compile(&SafetyPreferences::default());
        let prompt = subtitle_prompt("Japanese", true, &policy);
        assert!(prompt.system.contains("IGNORE any subtitles"));
        assert!(prompt.system.contains("Alpha Language"));
        assert!(prompt.system.contains("<i>(Spanish) Hello.</i>"));
        assert!(prompt.system.contains("Context Mode: ON"));
        assert!(prompt.system.contains("translate ALL content into Japanese"));
        assert!(prompt.system.contains("exactly ONE valid SRT document"));
        for directive in &policy.directives {
            assert!(prompt.system.contains(directive.as_str()));
        }
        assert!(prompt.user.contains("Include sound effects (SDH): true"));
    }

    #[test]
    fn sfx_off_restricts_to_dialogue() {
        let policy = compile(&SafetyPreferences::default());
        let prompt = subtitle_prompt("English", false, &policy);
        assert!(prompt.system.contains("Context Mode: OFF"));
        assert!(!prompt.system.contains("Context Mode: ON"));
    }

    #[test]
    fn chapter_prompt_asks_for_line_format() {
        let prompt = chapter_prompt();
        assert!(prompt.user.contains("'MM:SS - Title'"));
        assert!(prompt.user.contains("00:00"));
        assert!(prompt.user.contains("2 to 4 words"));
    }

    #[test]
    fn assistant_prompt_uses_placeholders_when_empty() {
        let policy = compile(&SafetyPreferences::default());
        let context = DialogueContext {
            subtitles: None,
            chapters: &[],
            user_text: "Who is talking at 01:00?",
            max_subtitle_chars: 100,
        };
        let prompt = assistant_prompt(&context, &policy);
        assert!(prompt.user.contains(NO_CHAPTERS));
        assert!(prompt.user.contains(NO_SUBTITLES));
        assert!(prompt.user.ends_with("Who is talking at 01:00?"));
        for prefix in [PATCH_PREFIX, CHAPTERS_PREFIX, SEEK_PREFIX, ANSWER_PREFIX] {
            assert!(prompt.system.contains(prefix));
        }
        assert!(prompt.system.contains("FOUND IN VIDEO"));
    }

    #[test]
    fn long_tracks_are_truncated() {
        let policy = compile(&SafetyPreferences::default());
        let track = "é".repeat(50);
        let chapters = [Chapter::new("00:00", "Intro")];
        let context = DialogueContext {
            subtitles: Some(&track),
            chapters: &chapters,
            user_text: "fix typos",
            max_subtitle_chars: 10,
        };
        let prompt = assistant_prompt(&context, &policy);
        assert!(prompt.user.contains(&format!("{}{}", "é".repeat(10), TRUNCATION_NOTE)));
        assert!(prompt.user.contains("00:00 - Intro"));
    }
}
