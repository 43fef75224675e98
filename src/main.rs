mod common;
mod ui;
mod video;

use clap::Parser;

use crate::ui::prelude::{Level, OutputFormat, emit};
use crate::video::WeltCommands;

/// Welt: AI subtitles, chapters and a video assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for messages
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Gemini API key (overrides GEMINI_API_KEY and the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: WeltCommands,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    ui::init(cli.output, cli.output == OutputFormat::Text);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = video::handle_welt_command(cli.command, cli.api_key).await {
        emit(Level::Error, "welt.error", &format!("{:#}", err), None);
        std::process::exit(1);
    }
}
