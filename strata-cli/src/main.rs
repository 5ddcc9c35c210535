//! ## strata-cli
//! **Command-line entry point for experiments and tournaments**
//!
//! Both commands read a YAML configuration (explicit path, or the default
//! `config/strata.yaml` hierarchy) and print JSON results to stdout.

use clap::Parser;

mod build;
mod commands;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli)
}
