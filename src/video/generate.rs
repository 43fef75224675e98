use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use super::chapters::format_chapters;
use super::cli::{ChaptersArgs, SubtitlesArgs};
use super::commands::Session;
use super::srt;
use super::support::utils::canonicalize_existing;
use crate::common::progress::{create_spinner, finish_spinner};
use crate::ui::prelude::{Level, emit};

pub async fn handle_subtitles(args: SubtitlesArgs, session: &Session) -> Result<()> {
    let video = canonicalize_existing(&args.video)?;
    let output = args
        .out_file
        .clone()
        .unwrap_or_else(|| default_subtitle_path(&video));

    if output.exists() && !args.overwrite {
        bail!(
            "Subtitle file already exists at {}. Use --overwrite to replace it.",
            output.display()
        );
    }

    let (config, welt) = session.connect(args.force)?;
    let prefs = args.safety.merged_with(config.safety_preferences());
    let language = args
        .language
        .clone()
        .unwrap_or_else(|| config.target_language.clone());
    let include_sfx = args.sfx || config.include_sfx;

    emit(
        Level::Info,
        "welt.subtitles.start",
        &format!(
            "Generating {} subtitles for {}...",
            language,
            video.display()
        ),
        None,
    );

    let pb = create_spinner("Waiting for the model...".to_string());
    let result = welt
        .generate_subtitles(&video, &language, include_sfx, &prefs)
        .await;
    finish_spinner(pb);
    let raw = result?;

    // Only a track that validates is ever written
    let track = srt::validate(&raw).context("The model did not return a usable subtitle track")?;

    fs::write(&output, track.to_string())
        .with_context(|| format!("writing subtitles to {}", output.display()))?;

    emit(
        Level::Success,
        "welt.subtitles.written",
        &format!("Wrote {} cues to {}", track.len(), output.display()),
        Some(serde_json::json!({
            "path": output.display().to_string(),
            "cues": track.len(),
            "language": language,
        })),
    );
    Ok(())
}

pub async fn handle_chapters(args: ChaptersArgs, session: &Session) -> Result<()> {
    let video = canonicalize_existing(&args.video)?;
    let (config, welt) = session.connect(args.force)?;
    let prefs = args.safety.merged_with(config.safety_preferences());

    let pb = create_spinner("Finding chapters...".to_string());
    let result = welt.generate_chapters(&video, &prefs).await;
    finish_spinner(pb);
    let chapters = result?;

    if chapters.is_empty() {
        emit(
            Level::Warn,
            "welt.chapters.empty",
            "The model did not return any chapters",
            None,
        );
        return Ok(());
    }

    let text = format_chapters(&chapters);
    match &args.out_file {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("writing chapters to {}", path.display()))?;
            emit(
                Level::Success,
                "welt.chapters.written",
                &format!("Wrote {} chapters to {}", chapters.len(), path.display()),
                Some(serde_json::json!({
                    "path": path.display().to_string(),
                    "chapters": chapters,
                })),
            );
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn default_subtitle_path(video: &Path) -> PathBuf {
    video.with_extension("srt")
}
