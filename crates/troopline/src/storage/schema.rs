//! `SQLite` schema definitions for troopline.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the soldiers table.
pub const CREATE_SOLDIERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS Soldiers (
    SoldierID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Rank TEXT NOT NULL,
    Country TEXT NOT NULL,
    TrainingInfo TEXT NOT NULL
)
";

/// SQL statement to create the positions table.
///
/// Removing a soldier removes its positions.
pub const CREATE_POSITIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS Positions (
    PositionID INTEGER PRIMARY KEY AUTOINCREMENT,
    SoldierID INTEGER NOT NULL REFERENCES Soldiers(SoldierID) ON DELETE CASCADE,
    Latitude REAL NOT NULL,
    Longitude REAL NOT NULL,
    Timestamp TEXT NOT NULL
)
";

/// SQL statement to create an index on the position foreign key.
pub const CREATE_POSITIONS_SOLDIER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_positions_soldier ON Positions(SoldierID)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SOLDIERS_TABLE,
    CREATE_POSITIONS_TABLE,
    CREATE_POSITIONS_SOLDIER_INDEX,
    CREATE_METADATA_TABLE,
];
