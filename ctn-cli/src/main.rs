//! CTN CLI - Command line tool for cleaning crowd-sourced temperature
//! network data against a trusted reference network.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "ctn-cli",
    version,
    about = "Crowd-sourced temperature network cleaning toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: ctn_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    ctn_cmd::run(cli.command)
}
