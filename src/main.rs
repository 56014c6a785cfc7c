mod init;
mod login;
mod logout;
mod status;
pub mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::util::config::FileSettings;

#[derive(Debug, Parser)]
#[command(name = "gpterm")]
#[command(about = "OpenAI-backed terminal assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Set up API credentials interactively (skipped if already configured)
    Init,
    /// Show the active configuration
    Status,
    /// Save an API key without the interactive setup
    #[command(arg_required_else_help = true)]
    Login {
        api_key: String,
        /// Write to ./.gpterm/config.json instead of the user settings
        #[arg(long)]
        project: bool,
    },
    /// Remove the stored API key
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let mut store = FileSettings::open()?;

    match args.command {
        Commands::Init => init::init(&mut store).await,
        Commands::Status => status::status(&store),
        Commands::Login { api_key, project } => login::login(&mut store, api_key, project),
        Commands::Logout => logout::logout(&mut store).await,
    }
}
