use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::chapters::{Chapter, format_chapters, format_timestamp_label, parse_chapter_lines};
use super::cli::AskArgs;
use super::commands::Session;
use super::pipeline::TurnInput;
use super::router::{AssistantIntent, Diagnostic, Routed};
use super::support::utils::canonicalize_existing;
use crate::common::progress::{create_spinner, finish_spinner};
use crate::ui::prelude::{Level, emit};

pub async fn handle_ask(args: AskArgs, session: &Session) -> Result<()> {
    let video = canonicalize_existing(&args.video)?;

    let subtitles = match &args.subtitles {
        Some(path) if path.exists() => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading subtitles from {}", path.display()))?,
        ),
        _ => None,
    };
    let chapters = match &args.chapters {
        Some(path) if path.exists() => read_chapters(path)?,
        _ => Vec::new(),
    };

    let (config, welt) = session.connect(args.force)?;
    let input = TurnInput {
        subtitles: subtitles.as_deref(),
        chapters: &chapters,
        user_text: &args.instruction,
        safety: args.safety.merged_with(config.safety_preferences()),
    };

    let pb = create_spinner("Thinking...".to_string());
    let result = welt.assistant_turn(&video, &input).await;
    finish_spinner(pb);
    let routed = result?;

    report_diagnostics(&routed);
    present(routed.intent, &args)
}

fn read_chapters(path: &Path) -> Result<Vec<Chapter>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading chapters from {}", path.display()))?;
    let mut parsed = parse_chapter_lines(&text);
    for (chapter, err) in parsed.take_unreadable() {
        emit(
            Level::Warn,
            "welt.chapters.dropped",
            &format!("Skipping chapter '{}': {}", chapter, err),
            None,
        );
    }
    for line in &parsed.dropped {
        emit(
            Level::Warn,
            "welt.chapters.dropped",
            &format!("Skipping malformed chapter line: {}", line),
            None,
        );
    }
    Ok(parsed.chapters)
}

fn report_diagnostics(routed: &Routed) {
    for diagnostic in &routed.diagnostics {
        let message = match diagnostic {
            Diagnostic::DroppedChapterLine(line) => {
                format!("Dropped chapter line without separator: {}", line)
            }
            Diagnostic::SeekParseFailure { token, reason } => {
                format!("Could not read seek target '{}': {}", token, reason)
            }
            Diagnostic::PatchRejected(reason) => {
                format!("Rejected proposed subtitles: {}", reason)
            }
        };
        emit(Level::Warn, "welt.assistant.diagnostic", &message, None);
    }
}

fn present(intent: AssistantIntent, args: &AskArgs) -> Result<()> {
    match intent {
        AssistantIntent::Patch(track) => match (&args.subtitles, args.apply) {
            (Some(path), true) => {
                fs::write(path, &track)
                    .with_context(|| format!("writing subtitles to {}", path.display()))?;
                emit(
                    Level::Success,
                    "welt.assistant.patch",
                    &format!("Updated subtitles in {}", path.display()),
                    Some(serde_json::json!({ "path": path.display().to_string() })),
                );
            }
            _ => {
                emit(
                    Level::Info,
                    "welt.assistant.patch",
                    "Proposed subtitles (pass --subtitles FILE --apply to save):",
                    None,
                );
                print!("{}", track);
            }
        },
        AssistantIntent::ChapterUpdate(chapters) => {
            let text = format_chapters(&chapters);
            match (&args.chapters, args.apply) {
                (Some(path), true) => {
                    fs::write(path, &text)
                        .with_context(|| format!("writing chapters to {}", path.display()))?;
                    emit(
                        Level::Success,
                        "welt.assistant.chapters",
                        &format!("Updated {} chapters in {}", chapters.len(), path.display()),
                        Some(serde_json::json!({ "path": path.display().to_string() })),
                    );
                }
                _ => {
                    emit(
                        Level::Info,
                        "welt.assistant.chapters",
                        "Proposed chapters (pass --chapters FILE --apply to save):",
                        Some(serde_json::json!({ "chapters": chapters })),
                    );
                    print!("{}", text);
                }
            }
        }
        AssistantIntent::Seek {
            seconds,
            description,
        } => {
            emit(
                Level::Info,
                "welt.assistant.seek",
                &format!("Seek to {}: {}", format_timestamp_label(seconds), description),
                Some(serde_json::json!({
                    "seconds": seconds,
                    "description": description,
                })),
            );
        }
        AssistantIntent::ScanResult(report) => {
            emit(Level::Info, "welt.assistant.scan", report.trim(), None);
        }
        AssistantIntent::Answer(answer) => {
            emit(Level::Info, "welt.assistant.answer", answer.trim(), None);
        }
    }
    Ok(())
}
