//! Core record types for troopline.
//!
//! This module defines the two persisted entities: soldiers and the
//! positions reported for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A soldier record.
///
/// All descriptive fields are free-form text; nothing is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Soldier {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Full name.
    pub name: String,

    /// Military rank.
    pub rank: String,

    /// Country of service.
    pub country: String,

    /// Training notes.
    pub training_info: String,
}

impl Soldier {
    /// Create a new, unsaved soldier record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        rank: impl Into<String>,
        country: impl Into<String>,
        training_info: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            rank: rank.into(),
            country: country.into(),
            training_info: training_info.into(),
        }
    }

    /// Return this record with the given identifier.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Check if the record has been assigned an identifier.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// A reported geographic position of a soldier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// The soldier this position belongs to.
    pub soldier_id: i64,

    /// Latitude in decimal degrees.
    pub latitude: f64,

    /// Longitude in decimal degrees.
    pub longitude: f64,

    /// When the position was reported.
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Create a new, unsaved position record.
    #[must_use]
    pub fn new(soldier_id: i64, latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            soldier_id,
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Create a new position stamped with the current time.
    #[must_use]
    pub fn now(soldier_id: i64, latitude: f64, longitude: f64) -> Self {
        Self::new(soldier_id, latitude, longitude, Utc::now())
    }

    /// Return this record with the given identifier.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Check if the record has been assigned an identifier.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
