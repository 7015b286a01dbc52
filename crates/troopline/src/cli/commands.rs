//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::OutputFormat;

/// Soldier commands.
#[derive(Debug, Subcommand)]
pub enum SoldierCommand {
    /// List all soldiers
    List {
        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show one soldier
    Get {
        /// Soldier identifier
        id: i64,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Add a soldier
    Add(SoldierFields),

    /// Replace every field of a soldier
    Update {
        /// Soldier identifier
        id: i64,

        /// Record fields
        #[command(flatten)]
        fields: SoldierFields,
    },

    /// Delete a soldier and its positions
    Delete {
        /// Soldier identifier
        id: i64,
    },
}

/// Fields of a soldier record.
#[derive(Debug, Clone, Args)]
pub struct SoldierFields {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Rank
    #[arg(long)]
    pub rank: String,

    /// Country of service
    #[arg(long)]
    pub country: String,

    /// Training notes
    #[arg(long, default_value = "")]
    pub training: String,
}

/// Position commands.
#[derive(Debug, Subcommand)]
pub enum PositionCommand {
    /// List positions, optionally for one soldier
    List {
        /// Only positions of this soldier
        #[arg(short, long)]
        soldier: Option<i64>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show one position
    Get {
        /// Position identifier
        id: i64,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Record a position
    Add(PositionFields),

    /// Replace every field of a position
    Update {
        /// Position identifier
        id: i64,

        /// Record fields
        #[command(flatten)]
        fields: PositionFields,
    },

    /// Delete a position
    Delete {
        /// Position identifier
        id: i64,
    },
}

/// Fields of a position record.
#[derive(Debug, Clone, Args)]
pub struct PositionFields {
    /// Owning soldier identifier
    #[arg(short, long)]
    pub soldier: i64,

    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Report time as RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
