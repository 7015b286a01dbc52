//! CRUD services over the persistence context.
//!
//! Each service is an async trait so callers can depend on the contract and
//! swap the backing implementation; the `Sqlite*` types are the only ones
//! shipped. Every mutation is its own unit of work.

mod position;
mod soldier;

use async_trait::async_trait;

use crate::entity::{Position, Soldier};
use crate::error::{Error, Result};
use crate::storage::Saved;

pub use position::SqlitePositionService;
pub use soldier::SqliteSoldierService;

/// Operations on soldier records.
#[async_trait]
pub trait SoldierService: Send + Sync {
    /// Get every soldier in storage order.
    async fn list_all(&self) -> Result<Vec<Soldier>>;

    /// Get a soldier by identifier, `None` if there is no such soldier.
    async fn get_by_id(&self, id: i64) -> Result<Option<Soldier>>;

    /// Persist a new soldier and return it with its assigned identifier.
    async fn add(&self, soldier: Soldier) -> Result<Soldier>;

    /// Overwrite every field of an existing soldier.
    async fn update(&self, soldier: Soldier) -> Result<Soldier>;

    /// Remove a soldier. Returns `false` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Operations on position records.
#[async_trait]
pub trait PositionService: Send + Sync {
    /// Get every position in storage order.
    async fn list_all(&self) -> Result<Vec<Position>>;

    /// Get the positions reported for one soldier.
    async fn list_by_soldier(&self, soldier_id: i64) -> Result<Vec<Position>>;

    /// Get a position by identifier, `None` if there is no such position.
    async fn get_by_id(&self, id: i64) -> Result<Option<Position>>;

    /// Persist a new position and return it with its assigned identifier.
    async fn add(&self, position: Position) -> Result<Position>;

    /// Overwrite every field of an existing position.
    async fn update(&self, position: Position) -> Result<Position>;

    /// Remove a position. Returns `false` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Identifier produced by the queued change at `key`.
fn saved_id(saved: &[Saved], key: usize) -> Result<i64> {
    saved
        .get(key)
        .map(|s| s.id)
        .ok_or_else(|| Error::internal(format!("no saved result for change {key}")))
}
