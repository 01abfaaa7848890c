//! Command-line definitions for the `far117` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::Verbosity;

/// far117 - FAR 117 flight duty and rest checks
///
/// Advisory only; does not replace official duty-time computation.
#[derive(Debug, Parser)]
#[command(name = "far117")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up the Table B FDP limit
    Limit(LimitArgs),

    /// Classify an FDP against its limit
    Classify(ClassifyArgs),

    /// Check whether a trip can be picked up
    Pickup(PickupArgs),

    /// List the built-in pickup presets
    Presets(OutputArgs),

    /// Show today's duty from the schedule
    Today(RosterArgs),

    /// Show the current FAR 117 status from the schedule
    Status(RosterArgs),

    /// Simulate a delay on the current or next duty
    Delay(DelayArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RosterArgs {
    /// Schedule JSON file (defaults to schedule.path from the config)
    #[arg(short, long, value_name = "FILE")]
    pub schedule: Option<PathBuf>,

    /// Evaluate at this RFC 3339 instant instead of the current time
    #[arg(long, value_name = "DATETIME")]
    pub now: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct LimitArgs {
    /// Acclimated local report hour (0-23)
    #[arg(long)]
    pub report_hour: i32,

    /// Number of flight segments
    #[arg(long)]
    pub legs: i32,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// FDP in hours
    #[arg(long)]
    pub fdp: f64,

    /// FDP limit in hours
    #[arg(long, conflicts_with_all = ["report_hour", "legs"])]
    pub limit: Option<f64>,

    /// Derive the limit from this report hour (with --legs)
    #[arg(long, requires = "legs")]
    pub report_hour: Option<i32>,

    /// Derive the limit from this segment count (with --report-hour)
    #[arg(long, requires = "report_hour")]
    pub legs: Option<i32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct PickupArgs {
    /// Start from a preset ("Early 2", "Mid 3", "Late 3", "Red-eye")
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Local report time, HH:MM
    #[arg(long, value_name = "HH:MM")]
    pub report: Option<String>,

    /// Number of flight segments
    #[arg(long)]
    pub legs: Option<i32>,

    /// Total block time, H:MM
    #[arg(long, value_name = "H:MM")]
    pub block: Option<String>,

    /// Skip the 28-day and rest checks even if a schedule is configured
    #[arg(long)]
    pub no_history: bool,

    #[command(flatten)]
    pub roster: RosterArgs,
}

#[derive(Debug, Args)]
pub struct DelayArgs {
    /// Delay in minutes
    pub minutes: i64,

    #[command(flatten)]
    pub roster: RosterArgs,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show(OutputArgs),

    /// Print the default configuration file path
    Path,
}

impl Cli {
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
