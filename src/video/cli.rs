use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

use super::safety::SafetyPreferences;

#[derive(Subcommand, Debug, Clone)]
pub enum WeltCommands {
    /// Generate translated subtitles for a video
    Subtitles(SubtitlesArgs),
    /// Normalize an existing subtitle file into canonical SRT
    Repair(RepairArgs),
    /// Generate chapter markers for a video
    Chapters(ChaptersArgs),
    /// Ask the assistant about a video, its subtitles or its chapters
    Ask(AskArgs),
}

/// Mature content switches; each one overrides the config file when set
#[derive(Args, Debug, Clone, Default)]
pub struct SafetyArgs {
    /// Allow sexual content instead of blocking it
    #[arg(long)]
    pub allow_nsfw: bool,

    /// Allow graphic violence instead of blocking it
    #[arg(long)]
    pub allow_gore: bool,

    /// Keep profanity instead of censoring it
    #[arg(long)]
    pub allow_profanity: bool,
}

impl SafetyArgs {
    pub fn merged_with(&self, base: SafetyPreferences) -> SafetyPreferences {
        SafetyPreferences {
            allow_nsfw: base.allow_nsfw || self.allow_nsfw,
            allow_gore: base.allow_gore || self.allow_gore,
            allow_profanity: base.allow_profanity || self.allow_profanity,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SubtitlesArgs {
    /// Source video file
    #[arg(value_hint = ValueHint::FilePath)]
    pub video: PathBuf,

    /// Output language; defaults to target_language from the config
    #[arg(short = 'l', long = "language")]
    pub language: Option<String>,

    /// Transcribe sound effects and visual context ([Laughs], [Music])
    #[arg(long)]
    pub sfx: bool,

    #[command(flatten)]
    pub safety: SafetyArgs,

    /// Output file; defaults to <video>.srt next to the video
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Overwrite an existing subtitle file
    #[arg(long)]
    pub overwrite: bool,

    /// Upload the video again even if a cached upload exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RepairArgs {
    /// Subtitle file to normalize
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output file; prints to stdout when omitted
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ChaptersArgs {
    /// Source video file
    #[arg(value_hint = ValueHint::FilePath)]
    pub video: PathBuf,

    /// Output file; prints to stdout when omitted
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    #[command(flatten)]
    pub safety: SafetyArgs,

    /// Upload the video again even if a cached upload exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    /// Source video file
    #[arg(value_hint = ValueHint::FilePath)]
    pub video: PathBuf,

    /// What to ask or change
    pub instruction: String,

    /// Current subtitle track to show the assistant
    #[arg(short = 's', long = "subtitles", value_hint = ValueHint::FilePath)]
    pub subtitles: Option<PathBuf>,

    /// Current chapters file ("MM:SS - Title" per line)
    #[arg(short = 'c', long = "chapters", value_hint = ValueHint::FilePath)]
    pub chapters: Option<PathBuf>,

    /// Write proposed subtitle or chapter changes back to their files
    #[arg(long)]
    pub apply: bool,

    #[command(flatten)]
    pub safety: SafetyArgs,

    /// Upload the video again even if a cached upload exists
    #[arg(long)]
    pub force: bool,
}
