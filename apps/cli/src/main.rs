//! askctx CLI: ask a language model about a repository or a local file.
//!
//! Clones (or opens) the source, concatenates the selected files into one
//! context, and submits it with the question as a completion, chat, or
//! embedding request.

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
