use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const SEPARATOR: &str = " - ";

/// One chapter marker as the model wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// "MM:SS" or "H:MM:SS"
    pub timestamp: String,
    pub title: String,
}

impl Chapter {
    pub fn new(timestamp: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            title: title.into(),
        }
    }

    /// Offset of the chapter in whole seconds.
    pub fn seconds(&self) -> Result<u64, TimestampError> {
        parse_timestamp_label(&self.timestamp)
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.timestamp, SEPARATOR, self.title)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("expected MM:SS or H:MM:SS, got {fields} field(s) in '{label}'")]
    FieldCount { label: String, fields: usize },

    #[error("'{field}' in '{label}' is not a number")]
    NotNumeric { label: String, field: String },
}

/// Parse "MM:SS" or "H:MM:SS" into total seconds.
pub fn parse_timestamp_label(label: &str) -> Result<u64, TimestampError> {
    let fields: Vec<&str> = label.split(':').collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(TimestampError::FieldCount {
            label: label.to_string(),
            fields: fields.len(),
        });
    }

    let mut total = 0u64;
    for field in &fields {
        let trimmed = field.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(TimestampError::NotNumeric {
                label: label.to_string(),
                field: field.to_string(),
            });
        }
        let value = trimmed
            .parse::<u64>()
            .map_err(|_| TimestampError::NotNumeric {
                label: label.to_string(),
                field: field.to_string(),
            })?;
        total = total.saturating_mul(60).saturating_add(value);
    }

    Ok(total)
}

/// Inverse of [`parse_timestamp_label`]: "MM:SS", or "H:MM:SS" past an hour.
pub fn format_timestamp_label(seconds: u64) -> String {
    let (hours, minutes, secs) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Result of reading "timestamp - title" lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedChapters {
    pub chapters: Vec<Chapter>,
    /// Non-blank lines that had no separator
    pub dropped: Vec<String>,
}

impl ParsedChapters {
    /// Split off chapters whose timestamp is not a readable offset.
    pub fn take_unreadable(&mut self) -> Vec<(Chapter, TimestampError)> {
        let mut unreadable = Vec::new();
        let mut kept = Vec::with_capacity(self.chapters.len());
        for chapter in self.chapters.drain(..) {
            match chapter.seconds() {
                Ok(_) => kept.push(chapter),
                Err(err) => unreadable.push((chapter, err)),
            }
        }
        self.chapters = kept;
        unreadable
    }
}

/// Parse one chapter per line, splitting on the first " - ".
pub fn parse_chapter_lines(text: &str) -> ParsedChapters {
    let mut parsed = ParsedChapters::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(SEPARATOR) {
            Some((timestamp, title)) => parsed
                .chapters
                .push(Chapter::new(timestamp.trim(), title.trim())),
            None => parsed.dropped.push(line.trim().to_string()),
        }
    }

    parsed
}

/// Serialize chapters in the same line format they are parsed from.
pub fn format_chapters(chapters: &[Chapter]) -> String {
    chapters
        .iter()
        .map(|chapter| format!("{}\n", chapter))
        .collect()
}
