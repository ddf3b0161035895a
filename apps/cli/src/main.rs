//! InterviewPrep CLI: research a company's interview process from the terminal.
//!
//! Aggregates interview data from several sources, asks a language model to
//! turn it into a preparation guide, and keeps a local history of reports.

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
