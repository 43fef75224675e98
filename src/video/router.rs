//! Classify assistant replies into intents
//!
//! The model marks its intent with a textual prefix. Routing turns that text
//! into a closed [`AssistantIntent`] and never fails: anything unexpected
//! becomes an [`AssistantIntent::Answer`], with a [`Diagnostic`] recording
//! what was dropped or why a fallback happened.

use lazy_static::lazy_static;
use regex::Regex;

use super::chapters::{Chapter, TimestampError, parse_chapter_lines, parse_timestamp_label};

pub const PATCH_PREFIX: &str = "PATCH:";
pub const CHAPTERS_PREFIX: &str = "CHAPTERS:";
pub const SEEK_PREFIX: &str = "SEEK:";
pub const ANSWER_PREFIX: &str = "ANSWER:";

lazy_static! {
    static ref SCAN_FOUND: Regex =
        Regex::new(r"^[^\n]+? FOUND IN VIDEO \(\d+\) TIMES:").expect("valid scan regex");
    static ref SCAN_NOT_FOUND: Regex =
        Regex::new(r"^[^\n]+? NOT FOUND IN VIDEO\.").expect("valid scan regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantIntent {
    /// Replacement subtitle track, still unvalidated
    Patch(String),
    ChapterUpdate(Vec<Chapter>),
    Seek { seconds: u64, description: String },
    /// Verbatim content-scan report
    ScanResult(String),
    Answer(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A CHAPTERS line without a " - " separator
    DroppedChapterLine(String),
    /// A SEEK reply whose timestamp could not be read
    SeekParseFailure { token: String, reason: String },
    /// A PATCH reply whose track failed validation
    PatchRejected(String),
}

/// An intent plus whatever was lost getting there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub intent: AssistantIntent,
    pub diagnostics: Vec<Diagnostic>,
}

impl Routed {
    fn clean(intent: AssistantIntent) -> Self {
        Self {
            intent,
            diagnostics: Vec::new(),
        }
    }
}

pub fn route(raw: &str) -> Routed {
    let text = raw.trim_start();

    if let Some(rest) = text.strip_prefix(PATCH_PREFIX) {
        return Routed::clean(AssistantIntent::Patch(rest.to_string()));
    }

    if let Some(rest) = text.strip_prefix(CHAPTERS_PREFIX) {
        let parsed = parse_chapter_lines(rest);
        return Routed {
            intent: AssistantIntent::ChapterUpdate(parsed.chapters),
            diagnostics: parsed
                .dropped
                .into_iter()
                .map(Diagnostic::DroppedChapterLine)
                .collect(),
        };
    }

    if let Some(rest) = text.strip_prefix(SEEK_PREFIX) {
        return route_seek(rest);
    }

    if SCAN_FOUND.is_match(text) || SCAN_NOT_FOUND.is_match(text) {
        return Routed::clean(AssistantIntent::ScanResult(raw.to_string()));
    }

    if let Some(rest) = text.strip_prefix(ANSWER_PREFIX) {
        return Routed::clean(AssistantIntent::Answer(rest.trim().to_string()));
    }

    Routed::clean(AssistantIntent::Answer(raw.to_string()))
}

fn route_seek(rest: &str) -> Routed {
    let rest = rest.trim();
    let (token, description) = match rest.split_once(char::is_whitespace) {
        Some((token, description)) => (token, description.trim()),
        None => (rest, ""),
    };
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')' | '{' | '}'))
        .collect();

    match parse_timestamp_label(&cleaned) {
        Ok(seconds) => Routed::clean(AssistantIntent::Seek {
            seconds,
            description: description.to_string(),
        }),
        Err(err) => seek_fallback(token, err),
    }
}

fn seek_fallback(token: &str, err: TimestampError) -> Routed {
    let message = format!(
        "I wanted to jump to a moment in the video, but '{}' is not a timestamp I can use ({}).",
        token, err
    );
    Routed {
        intent: AssistantIntent::Answer(message),
        diagnostics: vec![Diagnostic::SeekParseFailure {
            token: token.to_string(),
            reason: err.to_string(),
        }],
    }
}
