//! `troopline` - soldier and position tracking over `SQLite`
//!
//! This library provides the entity types, the persistence context and the
//! CRUD services that callers (the `troopline` CLI, tests, or a UI) build on.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod service;
pub mod storage;

pub use config::Config;
pub use entity::{Position, Soldier};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use service::{PositionService, SoldierService, SqlitePositionService, SqliteSoldierService};
pub use storage::{Database, DatabaseStats, UnitOfWork};
