//! `far117` - command-line FAR 117 duty-time checks.
//!
//! Table B lookups, pickup feasibility, and status computed from a roster
//! JSON file. Advisory only.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

mod cli;
mod commands;
mod config;
mod logging;

use anyhow::Context;
use clap::Parser;

use crate::cli::Cli;
use crate::config::Config;
use crate::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("could not load configuration")?;

    commands::run(cli.command, &config)
}
