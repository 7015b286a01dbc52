//! Command-line interface for troopline.
//!
//! This module provides the CLI structure, argument conversion and output
//! rendering for the `troopline` binary.

mod commands;
mod output;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::entity::{Position, Soldier};
use crate::error::{Error, Result};
use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, PositionCommand, PositionFields, SoldierCommand, SoldierFields, StatusCommand,
};
pub use output::{render_positions, render_soldiers};

/// troopline - Track soldiers and their reported positions
#[derive(Debug, Parser)]
#[command(name = "troopline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage soldiers
    #[command(subcommand)]
    Soldier(SoldierCommand),

    /// Manage positions
    #[command(subcommand)]
    Position(PositionCommand),

    /// Show database location and record counts
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

impl SoldierFields {
    /// Build an unsaved soldier record from the arguments.
    #[must_use]
    pub fn into_soldier(self) -> Soldier {
        Soldier::new(self.name, self.rank, self.country, self.training)
    }
}

impl PositionFields {
    /// Build an unsaved position record from the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] if `--at` is not RFC 3339.
    pub fn into_position(self) -> Result<Position> {
        let timestamp = match self.at.as_deref() {
            Some(value) => parse_timestamp(value)?,
            None => Utc::now(),
        };
        Ok(Position::new(self.soldier, self.lat, self.lon, timestamp))
    }
}

/// Parse an RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if the value cannot be parsed.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp {
            value: value.to_string(),
        })
}
