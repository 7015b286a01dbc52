//! Rendering of records for terminal output.

use std::fmt::Write as _;

use crate::config::OutputFormat;
use crate::entity::{Position, Soldier};
use crate::error::Result;

/// Render soldiers in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_soldiers(soldiers: &[Soldier], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => out = serde_json::to_string_pretty(soldiers)?,
        OutputFormat::Plain => {
            for s in soldiers {
                let _ = writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}",
                    id_text(s.id),
                    s.name,
                    s.rank,
                    s.country,
                    s.training_info
                );
            }
        }
        OutputFormat::Table => {
            let _ = writeln!(
                out,
                "{:>6}  {:<24}  {:<14}  {:<14}  TRAINING",
                "ID", "NAME", "RANK", "COUNTRY"
            );
            for s in soldiers {
                let _ = writeln!(
                    out,
                    "{:>6}  {:<24}  {:<14}  {:<14}  {}",
                    id_text(s.id),
                    s.name,
                    s.rank,
                    s.country,
                    s.training_info
                );
            }
        }
    }
    Ok(out)
}

/// Render positions in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_positions(positions: &[Position], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => out = serde_json::to_string_pretty(positions)?,
        OutputFormat::Plain => {
            for p in positions {
                let _ = writeln!(
                    out,
                    "{}\t{}\t{:.6}\t{:.6}\t{}",
                    id_text(p.id),
                    p.soldier_id,
                    p.latitude,
                    p.longitude,
                    p.timestamp.to_rfc3339()
                );
            }
        }
        OutputFormat::Table => {
            let _ = writeln!(
                out,
                "{:>6}  {:>7}  {:>11}  {:>11}  TIMESTAMP",
                "ID", "SOLDIER", "LATITUDE", "LONGITUDE"
            );
            for p in positions {
                let _ = writeln!(
                    out,
                    "{:>6}  {:>7}  {:>11.6}  {:>11.6}  {}",
                    id_text(p.id),
                    p.soldier_id,
                    p.latitude,
                    p.longitude,
                    p.timestamp.to_rfc3339()
                );
            }
        }
    }
    Ok(out)
}

fn id_text(id: Option<i64>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}
