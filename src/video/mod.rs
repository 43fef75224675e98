mod assist;
mod cache;
mod chapters;
pub mod cli;
pub mod commands;
mod config;
mod error;
mod gemini;
mod generate;
mod inference;
mod ingest;
mod pipeline;
mod prompts;
mod repair;
mod router;
mod safety;
mod srt;
mod support;
#[cfg(test)]
mod testing;

pub use cli::WeltCommands;
pub use commands::handle_welt_command;
