//! RZD CLI - Command line tool for root-zone storage deficit series.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "rzd-cli",
    version,
    about = "Root-zone storage deficit toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: rzd_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Starting rzd-cli {}", env!("CARGO_PKG_VERSION"));
    rzd_cmd::run(cli.command)
}
