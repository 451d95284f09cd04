//! linkprompt CLI: answer a fixed set of prompts for every page in a link file.
//!
//! Runs forever, picking up links appended to the file while it sleeps.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::run(cli).await
}
