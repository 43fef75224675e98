use anyhow::Result;

use super::assist::handle_ask;
use super::cli::WeltCommands;
use super::config::WeltConfig;
use super::generate::{handle_chapters, handle_subtitles};
use super::pipeline::Welt;
use super::repair::handle_repair;

pub async fn handle_welt_command(command: WeltCommands, api_key: Option<String>) -> Result<()> {
    let session = Session { api_key };
    match command {
        WeltCommands::Subtitles(args) => handle_subtitles(args, &session).await,
        WeltCommands::Repair(args) => handle_repair(args),
        WeltCommands::Chapters(args) => handle_chapters(args, &session).await,
        WeltCommands::Ask(args) => handle_ask(args, &session).await,
    }
}

/// Global options shared by every command that talks to the provider
pub struct Session {
    api_key: Option<String>,
}

impl Session {
    /// Load the config and build a connected pipeline. `force` skips the
    /// upload cache for this run.
    pub fn connect(&self, force: bool) -> Result<(WeltConfig, Welt)> {
        let config = WeltConfig::load()?;
        let api_key = config.resolve_api_key(self.api_key.as_deref())?;
        let welt = Welt::from_config(&config, api_key, !force)?;
        Ok((config, welt))
    }
}
