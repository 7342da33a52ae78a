//! Mirror routing CLI binary.

mod cli;
mod commands;
mod config;

use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();
    mirror_observability::init_logging(&cli.logs)?;
    cli.run().await
}
