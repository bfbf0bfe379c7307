//! Atlas CLI — turn YouTube lectures into structured Notion pages.
//!
//! Fetches captions, sections them, runs the summarizer/formatter/research
//! agents, compiles the markdown to typed blocks, and publishes the page.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
