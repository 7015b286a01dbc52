//! `troopline` - CLI for soldier and position tracking
//!
//! This binary drives the soldier and position services from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;

use troopline::cli::{
    render_positions, render_soldiers, Cli, Command, ConfigCommand, PositionCommand,
    SoldierCommand,
};
use troopline::config::OutputFormat;
use troopline::{
    init_logging, Config, Database, PositionService, SoldierService, SqlitePositionService,
    SqliteSoldierService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    if let Command::Config(ConfigCommand::Validate { file }) = cli.command {
        let path = file
            .or(cli.config)
            .unwrap_or_else(Config::default_config_path);
        return validate_config(&path);
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Soldier(cmd) => {
            let db = open_database(&config)?;
            handle_soldier(SqliteSoldierService::new(db), &config, cmd).await
        }
        Command::Position(cmd) => {
            let db = open_database(&config)?;
            handle_position(SqlitePositionService::new(db), &config, cmd).await
        }
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let path = config.database_path();
    Database::from_config(config)
        .with_context(|| format!("opening database at {}", path.display()))
}

fn resolve_format(config: &Config, format: Option<OutputFormat>) -> OutputFormat {
    format.unwrap_or(config.output.format)
}

async fn handle_soldier(
    service: impl SoldierService,
    config: &Config,
    cmd: SoldierCommand,
) -> anyhow::Result<()> {
    match cmd {
        SoldierCommand::List { format } => {
            let soldiers = service.list_all().await?;
            print!("{}", render_soldiers(&soldiers, resolve_format(config, format))?);
        }
        SoldierCommand::Get { id, format } => {
            let Some(soldier) = service.get_by_id(id).await? else {
                bail!("soldier {id} not found");
            };
            print!("{}", render_soldiers(&[soldier], resolve_format(config, format))?);
        }
        SoldierCommand::Add(fields) => {
            let soldier = service.add(fields.into_soldier()).await?;
            println!("{}", soldier.id.unwrap_or_default());
        }
        SoldierCommand::Update { id, fields } => {
            service.update(fields.into_soldier().with_id(id)).await?;
            println!("Updated soldier {id}");
        }
        SoldierCommand::Delete { id } => {
            if service.delete(id).await? {
                println!("Deleted soldier {id}");
            } else {
                bail!("soldier {id} not found");
            }
        }
    }
    Ok(())
}

async fn handle_position(
    service: impl PositionService,
    config: &Config,
    cmd: PositionCommand,
) -> anyhow::Result<()> {
    match cmd {
        PositionCommand::List { soldier, format } => {
            let positions = match soldier {
                Some(soldier_id) => service.list_by_soldier(soldier_id).await?,
                None => service.list_all().await?,
            };
            print!("{}", render_positions(&positions, resolve_format(config, format))?);
        }
        PositionCommand::Get { id, format } => {
            let Some(position) = service.get_by_id(id).await? else {
                bail!("position {id} not found");
            };
            print!("{}", render_positions(&[position], resolve_format(config, format))?);
        }
        PositionCommand::Add(fields) => {
            let position = service.add(fields.into_position()?).await?;
            println!("{}", position.id.unwrap_or_default());
        }
        PositionCommand::Update { id, fields } => {
            service.update(fields.into_position()?.with_id(id)).await?;
            println!("Updated position {id}");
        }
        PositionCommand::Delete { id } => {
            if service.delete(id).await? {
                println!("Deleted position {id}");
            } else {
                bail!("position {id} not found");
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let stats = db.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": db.path().display().to_string(),
            "soldiers": stats.soldiers,
            "positions": stats.positions,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("troopline status");
        println!("----------------");
        println!("Database:      {}", db.path().display());
        println!("Soldiers:      {}", stats.soldiers);
        println!("Positions:     {}", stats.positions);
        println!("Size (bytes):  {}", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!("  WAL enabled:        {}", config.storage.wal_enabled);
                println!();
                println!("[Output]");
                println!("  Format:             {:?}", config.output.format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            validate_config(&path)?;
        }
    }
    Ok(())
}

/// Load `path` without using it, failing when it does not hold a valid configuration.
fn validate_config(path: &Path) -> anyhow::Result<()> {
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path.to_path_buf()))
        .with_context(|| format!("configuration at {} is invalid", path.display()))?;
    println!("Configuration is valid.");
    Ok(())
}
