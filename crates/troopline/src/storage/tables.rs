//! Typed views over the `Soldiers` and `Positions` tables.
//!
//! Read queries live on [`SoldierTable`] and [`PositionTable`]; the write
//! helpers at the bottom are only called by the unit of work while it
//! flushes pending changes inside a transaction.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::entity::{Position, Soldier};
use crate::error::{Error, Result};

const SOLDIER_COLUMNS: &str = "SoldierID, Name, Rank, Country, TrainingInfo";
const POSITION_COLUMNS: &str = "PositionID, SoldierID, Latitude, Longitude, Timestamp";

/// Read access to the `Soldiers` table.
#[derive(Debug, Clone, Copy)]
pub struct SoldierTable<'c> {
    conn: &'c Connection,
}

impl<'c> SoldierTable<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Get every soldier, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all(&self) -> Result<Vec<Soldier>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SOLDIER_COLUMNS} FROM Soldiers ORDER BY SoldierID"
        ))?;
        let soldiers = stmt
            .query_map([], row_to_soldier)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(soldiers)
    }

    /// Get a soldier by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, id: i64) -> Result<Option<Soldier>> {
        let soldier = self
            .conn
            .query_row(
                &format!("SELECT {SOLDIER_COLUMNS} FROM Soldiers WHERE SoldierID = ?1"),
                [id],
                row_to_soldier,
            )
            .optional()?;
        Ok(soldier)
    }

    /// Count soldiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM Soldiers", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Read access to the `Positions` table.
#[derive(Debug, Clone, Copy)]
pub struct PositionTable<'c> {
    conn: &'c Connection,
}

impl<'c> PositionTable<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Get every position, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn all(&self) -> Result<Vec<Position>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POSITION_COLUMNS} FROM Positions ORDER BY PositionID"
        ))?;
        let positions = stmt
            .query_map([], row_to_position)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(positions)
    }

    /// Get a position by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, id: i64) -> Result<Option<Position>> {
        let position = self
            .conn
            .query_row(
                &format!("SELECT {POSITION_COLUMNS} FROM Positions WHERE PositionID = ?1"),
                [id],
                row_to_position,
            )
            .optional()?;
        Ok(position)
    }

    /// Get the positions of one soldier, oldest first.
    ///
    /// Returns an empty list when the soldier has none or does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn by_soldier(&self, soldier_id: i64) -> Result<Vec<Position>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {POSITION_COLUMNS} FROM Positions WHERE SoldierID = ?1
            ORDER BY Timestamp, PositionID
            "
        ))?;
        let positions = stmt
            .query_map([soldier_id], row_to_position)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(positions)
    }

    /// Count positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM Positions", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub(crate) fn insert_soldier(conn: &Connection, soldier: &Soldier) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO Soldiers (Name, Rank, Country, TrainingInfo)
        VALUES (?1, ?2, ?3, ?4)
        ",
        params![
            soldier.name,
            soldier.rank,
            soldier.country,
            soldier.training_info
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite every column of the row. Returns the number of rows touched.
pub(crate) fn update_soldier(conn: &Connection, id: i64, soldier: &Soldier) -> Result<usize> {
    let affected = conn.execute(
        r"
        UPDATE Soldiers SET Name = ?1, Rank = ?2, Country = ?3, TrainingInfo = ?4
        WHERE SoldierID = ?5
        ",
        params![
            soldier.name,
            soldier.rank,
            soldier.country,
            soldier.training_info,
            id
        ],
    )?;
    Ok(affected)
}

pub(crate) fn delete_soldier(conn: &Connection, id: i64) -> Result<usize> {
    let affected = conn.execute("DELETE FROM Soldiers WHERE SoldierID = ?1", [id])?;
    Ok(affected)
}

pub(crate) fn insert_position(conn: &Connection, position: &Position) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO Positions (SoldierID, Latitude, Longitude, Timestamp)
        VALUES (?1, ?2, ?3, ?4)
        ",
        params![
            position.soldier_id,
            position.latitude,
            position.longitude,
            timestamp_text(&position.timestamp)?
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite every column of the row. Returns the number of rows touched.
pub(crate) fn update_position(conn: &Connection, id: i64, position: &Position) -> Result<usize> {
    let affected = conn.execute(
        r"
        UPDATE Positions SET SoldierID = ?1, Latitude = ?2, Longitude = ?3, Timestamp = ?4
        WHERE PositionID = ?5
        ",
        params![
            position.soldier_id,
            position.latitude,
            position.longitude,
            timestamp_text(&position.timestamp)?,
            id
        ],
    )?;
    Ok(affected)
}

pub(crate) fn delete_position(conn: &Connection, id: i64) -> Result<usize> {
    let affected = conn.execute("DELETE FROM Positions WHERE PositionID = ?1", [id])?;
    Ok(affected)
}

/// Years that RFC 3339 can represent with four digits.
const TIMESTAMP_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Fixed-width UTC text so that `ORDER BY Timestamp` sorts chronologically.
///
/// Timestamps outside [`TIMESTAMP_YEARS`] have no RFC 3339 form and are
/// rejected before they reach the table.
fn timestamp_text(timestamp: &DateTime<Utc>) -> Result<String> {
    let text = timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
    if TIMESTAMP_YEARS.contains(&timestamp.year()) {
        Ok(text)
    } else {
        Err(Error::InvalidTimestamp { value: text })
    }
}

fn row_to_soldier(row: &Row) -> rusqlite::Result<Soldier> {
    Ok(Soldier {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        rank: row.get(2)?,
        country: row.get(3)?,
        training_info: row.get(4)?,
    })
}

fn row_to_position(row: &Row) -> rusqlite::Result<Position> {
    let timestamp_str: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Position {
        id: Some(row.get(0)?),
        soldier_id: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        timestamp,
    })
}
