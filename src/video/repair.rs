use anyhow::{Context, Result};
use std::fs;

use super::cli::RepairArgs;
use super::srt;
use crate::ui::prelude::{Level, emit};

pub fn handle_repair(args: RepairArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading subtitles from {}", args.input.display()))?;

    let track = srt::validate(&raw)
        .with_context(|| format!("{} is not a usable subtitle track", args.input.display()))?;

    match &args.out_file {
        Some(path) => {
            fs::write(path, track.to_string())
                .with_context(|| format!("writing subtitles to {}", path.display()))?;
            emit(
                Level::Success,
                "welt.repair.written",
                &format!("Wrote {} cues to {}", track.len(), path.display()),
                Some(serde_json::json!({
                    "path": path.display().to_string(),
                    "cues": track.len(),
                })),
            );
        }
        None => print!("{}", track),
    }
    Ok(())
}
