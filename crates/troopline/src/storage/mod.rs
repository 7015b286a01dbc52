//! Storage layer for troopline.
//!
//! This module provides the `SQLite`-backed persistence context: a shared
//! connection, the schema it carries, and the [`UnitOfWork`] through which
//! every read and write goes.

pub mod migrations;
pub mod schema;
mod tables;
mod unit_of_work;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, StorageConfig};
use crate::error::{Error, Result};

pub use tables::{PositionTable, SoldierTable};
pub use unit_of_work::{Change, Saved, UnitOfWork};

/// Path used to request an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Persistence context shared by the services.
///
/// Cloning is cheap and clones share the same connection. Access is
/// serialized: each [`UnitOfWork`] holds the connection lock until dropped.
#[derive(Debug, Clone)]
pub struct Database {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &StorageConfig::default())
    }

    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// enables foreign key enforcement and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open_with(path: impl AsRef<Path>, options: &StorageConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        prepare(&conn, options, true)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self::wrap(path, conn))
    }

    /// Create an in-memory database, mostly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(&StorageConfig::default())
    }

    fn open_in_memory_with(options: &StorageConfig) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;
        prepare(&conn, options, false)?;

        Ok(Self::wrap(PathBuf::from(MEMORY_PATH), conn))
    }

    /// Open the database selected by the configuration.
    ///
    /// A database path of `:memory:` opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.database_path();
        if path.as_os_str() == MEMORY_PATH {
            Self::open_in_memory_with(&config.storage)
        } else {
            Self::open_with(path, &config.storage)
        }
    }

    fn wrap(path: PathBuf, conn: Connection) -> Self {
        Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether this database lives only in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    /// Start a unit of work, blocking until the connection is free.
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder of the connection panicked.
    pub fn unit_of_work(&self) -> Result<UnitOfWork<'_>> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))?;
        Ok(UnitOfWork::new(guard))
    }

    /// Run `work` inside a fresh unit of work on the blocking thread pool.
    ///
    /// The connection is released when `work` returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns whatever `work` returns, or an internal error if the
    /// blocking task could not complete.
    pub async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut uow = db.unit_of_work()?;
            work(&mut uow)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let uow = self.unit_of_work()?;
        let soldiers = uow.soldiers().count()?;
        let positions = uow.positions().count()?;
        drop(uow);

        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path)?.len()
        };

        Ok(DatabaseStats {
            soldiers,
            positions,
            db_size_bytes,
        })
    }
}

/// Apply connection settings and bring the schema up to date.
fn prepare(conn: &Connection, options: &StorageConfig, file_backed: bool) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(options.busy_timeout())?;
    if file_backed && options.wal_enabled {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    }
    migrations::initialize_schema(conn)
}

/// Statistics about the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    /// Number of soldiers stored.
    pub soldiers: i64,
    /// Number of positions stored.
    pub positions: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Position, Soldier};

    fn create_test_db() -> Database {
        Database::open_in_memory().expect("failed to create test database")
    }

    fn cleanup(db_path: &Path) {
        let _ = std::fs::remove_file(db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_in_memory() {
        let db = create_test_db();
        assert!(db.is_in_memory());
        assert_eq!(db.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = create_test_db();
        let mut uow = db.unit_of_work().unwrap();

        uow.add_position(Position::now(12345, 10.0, 20.0));
        let err = uow.save_changes().unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_deleting_soldier_cascades_to_positions() {
        let db = create_test_db();
        let mut uow = db.unit_of_work().unwrap();

        let key = uow.add_soldier(Soldier::new("John Doe", "Private", "USA", ""));
        let soldier_id = uow.save_changes().unwrap()[key].id;
        uow.add_position(Position::now(soldier_id, 1.0, 1.0));
        uow.add_position(Position::now(soldier_id, 2.0, 2.0));
        uow.save_changes().unwrap();
        assert_eq!(uow.positions().count().unwrap(), 2);

        uow.remove_soldier(soldier_id);
        uow.save_changes().unwrap();
        assert_eq!(uow.positions().count().unwrap(), 0);
    }

    #[test]
    fn test_clones_share_connection() {
        let db = create_test_db();
        let other = db.clone();

        let mut uow = db.unit_of_work().unwrap();
        uow.add_soldier(Soldier::new("A", "B", "C", "D"));
        uow.save_changes().unwrap();
        drop(uow);

        assert_eq!(other.stats().unwrap().soldiers, 1);
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let db = create_test_db();
        let id = db
            .run(|uow| {
                let key = uow.add_soldier(Soldier::new("A", "B", "C", "D"));
                Ok(uow.save_changes()?[key].id)
            })
            .await
            .unwrap();

        let found = db.run(move |uow| uow.soldiers().find(id)).await.unwrap();
        assert_eq!(found.unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_run_propagates_errors() {
        let db = create_test_db();
        let result: Result<()> = db
            .run(|uow| {
                uow.remove_soldier(5);
                uow.save_changes().map(|_| ())
            })
            .await;
        assert!(result.unwrap_err().is_record_missing());
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_db().stats().unwrap();
        assert_eq!(stats.soldiers, 0);
        assert_eq!(stats.positions, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_open_file_based() {
        let db_path =
            std::env::temp_dir().join(format!("troopline_test_{}.db", std::process::id()));

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.path(), db_path);
        assert!(!db.is_in_memory());

        let mut uow = db.unit_of_work().unwrap();
        uow.add_soldier(Soldier::new("A", "B", "C", "D"));
        uow.save_changes().unwrap();
        drop(uow);

        let stats = db.stats().unwrap();
        assert_eq!(stats.soldiers, 1);
        assert!(stats.db_size_bytes > 0);

        drop(db);
        cleanup(&db_path);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let db_path =
            std::env::temp_dir().join(format!("troopline_reopen_{}.db", std::process::id()));

        {
            let db = Database::open(&db_path).unwrap();
            let mut uow = db.unit_of_work().unwrap();
            uow.add_soldier(Soldier::new("Jane Smith", "Sergeant", "UK", ""));
            uow.save_changes().unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let soldiers = db.unit_of_work().unwrap().soldiers().all().unwrap();
        assert_eq!(soldiers.len(), 1);
        assert_eq!(soldiers[0].name, "Jane Smith");

        drop(db);
        cleanup(&db_path);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("troopline_test_{}", std::process::id()));
        let nested_path = root.join("nested/db.sqlite");
        let _ = std::fs::remove_dir_all(&root);

        let db = Database::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(db);
        let _ = std::fs::remove_dir_all(&root);
    }

    fn journal_mode(db: &Database) -> String {
        let uow = db.unit_of_work().unwrap();
        uow.connection()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap()
    }

    fn busy_timeout_ms(db: &Database) -> i64 {
        let uow = db.unit_of_work().unwrap();
        uow.connection()
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_storage_options_applied() {
        let wal_path =
            std::env::temp_dir().join(format!("troopline_wal_{}.db", std::process::id()));
        let plain_path =
            std::env::temp_dir().join(format!("troopline_nowal_{}.db", std::process::id()));
        cleanup(&wal_path);
        cleanup(&plain_path);

        let wal = Database::open(&wal_path).unwrap();
        assert_eq!(journal_mode(&wal), "wal");
        assert_eq!(busy_timeout_ms(&wal), 5_000);

        let options = StorageConfig {
            database_path: None,
            busy_timeout_ms: 250,
            wal_enabled: false,
        };
        let plain = Database::open_with(&plain_path, &options).unwrap();
        assert_eq!(journal_mode(&plain), "delete");
        assert_eq!(busy_timeout_ms(&plain), 250);

        drop(wal);
        drop(plain);
        cleanup(&wal_path);
        cleanup(&plain_path);
    }

    #[test]
    fn test_stats_missing_file_is_io_error() {
        let db_path =
            std::env::temp_dir().join(format!("troopline_gone_{}.db", std::process::id()));
        let options = StorageConfig {
            wal_enabled: false,
            ..StorageConfig::default()
        };
        let db = Database::open_with(&db_path, &options).unwrap();
        cleanup(&db_path);

        assert!(matches!(db.stats().unwrap_err(), Error::Io(_)));
    }

    #[test]
    fn test_from_config_memory_path() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from(MEMORY_PATH));

        let db = Database::from_config(&config).unwrap();
        assert!(db.is_in_memory());
    }

    #[test]
    fn test_database_stats_serialize() {
        let stats = DatabaseStats {
            soldiers: 2,
            positions: 3,
            db_size_bytes: 512,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"soldiers\":2"));
        assert!(json.contains("\"positions\":3"));
    }
}
