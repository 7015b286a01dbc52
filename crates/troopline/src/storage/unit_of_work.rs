//! Unit of work over a locked database connection.
//!
//! Mutations are queued in memory and only reach the store when
//! [`UnitOfWork::save_changes`] flushes them in a single transaction.

use std::sync::MutexGuard;

use rusqlite::Connection;
use tracing::debug;

use crate::entity::{Position, Soldier};
use crate::error::{Error, Result};

use super::tables::{self, PositionTable, SoldierTable};

/// A change waiting to be flushed.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert a new soldier.
    AddSoldier(Soldier),
    /// Overwrite an existing soldier.
    UpdateSoldier(Soldier),
    /// Remove a soldier by identifier.
    RemoveSoldier(i64),
    /// Insert a new position.
    AddPosition(Position),
    /// Overwrite an existing position.
    UpdatePosition(Position),
    /// Remove a position by identifier.
    RemovePosition(i64),
}

impl Change {
    /// Entity kind this change touches.
    #[must_use]
    pub fn entity(&self) -> &'static str {
        match self {
            Self::AddSoldier(_) | Self::UpdateSoldier(_) | Self::RemoveSoldier(_) => "soldier",
            Self::AddPosition(_) | Self::UpdatePosition(_) | Self::RemovePosition(_) => "position",
        }
    }
}

/// Outcome of one flushed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saved {
    /// Identifier of the affected row (the assigned one for inserts).
    pub id: i64,
    /// Number of rows written.
    pub rows: usize,
}

/// A batch of pending changes bound to one connection.
///
/// Holds the connection lock for its whole lifetime; dropping it releases
/// the lock and discards anything not yet saved.
#[derive(Debug)]
pub struct UnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    pending: Vec<Change>,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self {
            conn,
            pending: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Query the committed soldiers.
    #[must_use]
    pub fn soldiers(&self) -> SoldierTable<'_> {
        SoldierTable::new(&self.conn)
    }

    /// Query the committed positions.
    #[must_use]
    pub fn positions(&self) -> PositionTable<'_> {
        PositionTable::new(&self.conn)
    }

    /// Queue a soldier insert. Any identifier on the record is ignored.
    ///
    /// Returns the index of the change in the queue, which is also its
    /// index in the result of [`Self::save_changes`].
    pub fn add_soldier(&mut self, soldier: Soldier) -> usize {
        self.push(Change::AddSoldier(soldier))
    }

    /// Queue a whole-record overwrite of a soldier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsavedRecord`] if the record has no identifier.
    pub fn update_soldier(&mut self, soldier: Soldier) -> Result<usize> {
        if soldier.id.is_none() {
            return Err(Error::UnsavedRecord { entity: "soldier" });
        }
        Ok(self.push(Change::UpdateSoldier(soldier)))
    }

    /// Queue removal of a soldier.
    pub fn remove_soldier(&mut self, id: i64) -> usize {
        self.push(Change::RemoveSoldier(id))
    }

    /// Queue a position insert. Any identifier on the record is ignored.
    pub fn add_position(&mut self, position: Position) -> usize {
        self.push(Change::AddPosition(position))
    }

    /// Queue a whole-record overwrite of a position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsavedRecord`] if the record has no identifier.
    pub fn update_position(&mut self, position: Position) -> Result<usize> {
        if position.id.is_none() {
            return Err(Error::UnsavedRecord { entity: "position" });
        }
        Ok(self.push(Change::UpdatePosition(position)))
    }

    /// Queue removal of a position.
    pub fn remove_position(&mut self, id: i64) -> usize {
        self.push(Change::RemovePosition(id))
    }

    /// Number of changes waiting to be saved.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop all queued changes without touching the store.
    pub fn discard_changes(&mut self) {
        self.pending.clear();
    }

    /// Flush all queued changes in one transaction.
    ///
    /// Changes apply in queue order. If any of them fails, the transaction
    /// is rolled back, nothing is committed and the queue is kept as is.
    ///
    /// # Errors
    ///
    /// Returns the first storage error, or [`Error::RecordMissing`] when an
    /// update or removal matches no row.
    pub fn save_changes(&mut self) -> Result<Vec<Saved>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.conn.transaction()?;
        let mut saved = Vec::with_capacity(self.pending.len());
        for change in &self.pending {
            saved.push(apply(&tx, change)?);
        }
        tx.commit()?;

        debug!("Saved {} change(s)", saved.len());
        self.pending.clear();
        Ok(saved)
    }

    fn push(&mut self, change: Change) -> usize {
        debug!("Queued {:?}", change);
        self.pending.push(change);
        self.pending.len() - 1
    }
}

fn apply(conn: &Connection, change: &Change) -> Result<Saved> {
    let entity = change.entity();
    let (id, rows) = match change {
        Change::AddSoldier(soldier) => (tables::insert_soldier(conn, soldier)?, 1),
        Change::UpdateSoldier(soldier) => {
            let id = require_id(entity, soldier.id)?;
            (id, tables::update_soldier(conn, id, soldier)?)
        }
        Change::RemoveSoldier(id) => (*id, tables::delete_soldier(conn, *id)?),
        Change::AddPosition(position) => (tables::insert_position(conn, position)?, 1),
        Change::UpdatePosition(position) => {
            let id = require_id(entity, position.id)?;
            (id, tables::update_position(conn, id, position)?)
        }
        Change::RemovePosition(id) => (*id, tables::delete_position(conn, *id)?),
    };

    if rows == 0 {
        return Err(Error::record_missing(entity, id));
    }
    Ok(Saved { id, rows })
}

fn require_id(entity: &'static str, id: Option<i64>) -> Result<i64> {
    id.ok_or(Error::UnsavedRecord { entity })
}
