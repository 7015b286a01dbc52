use async_trait::async_trait;
use tracing::debug;

use crate::entity::Position;
use crate::error::{Error, Result};
use crate::storage::Database;

use super::{saved_id, PositionService};

/// [`PositionService`] backed by a [`Database`].
///
/// Positions are written without checking that their soldier exists; the
/// foreign key in the store rejects dangling references.
#[derive(Debug, Clone)]
pub struct SqlitePositionService {
    db: Database,
}

impl SqlitePositionService {
    /// Create a service over the given database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PositionService for SqlitePositionService {
    async fn list_all(&self) -> Result<Vec<Position>> {
        self.db.run(|uow| uow.positions().all()).await
    }

    async fn list_by_soldier(&self, soldier_id: i64) -> Result<Vec<Position>> {
        self.db
            .run(move |uow| uow.positions().by_soldier(soldier_id))
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Position>> {
        self.db.run(move |uow| uow.positions().find(id)).await
    }

    async fn add(&self, mut position: Position) -> Result<Position> {
        let record = position.clone();
        let id = self
            .db
            .run(move |uow| {
                let key = uow.add_position(record);
                saved_id(&uow.save_changes()?, key)
            })
            .await?;

        debug!("Added position {} for soldier {}", id, position.soldier_id);
        position.id = Some(id);
        Ok(position)
    }

    async fn update(&self, position: Position) -> Result<Position> {
        let Some(id) = position.id else {
            return Err(Error::UnsavedRecord { entity: "position" });
        };

        let record = position.clone();
        self.db
            .run(move |uow| {
                uow.update_position(record)?;
                uow.save_changes().map(|_| ())
            })
            .await?;

        debug!("Updated position {}", id);
        Ok(position)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self
            .db
            .run(move |uow| {
                if uow.positions().find(id)?.is_none() {
                    return Ok(false);
                }
                uow.remove_position(id);
                uow.save_changes()?;
                Ok(true)
            })
            .await?;

        if deleted {
            debug!("Deleted position {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Soldier;
    use crate::service::{SoldierService, SqliteSoldierService};
    use chrono::{Duration, TimeZone, Utc};

    struct Fixture {
        soldiers: SqliteSoldierService,
        positions: SqlitePositionService,
    }

    fn create_fixture() -> Fixture {
        crate::logging::init_test_logging();
        let db = Database::open_in_memory().expect("failed to create test database");
        Fixture {
            soldiers: SqliteSoldierService::new(db.clone()),
            positions: SqlitePositionService::new(db),
        }
    }

    async fn add_soldier(fixture: &Fixture, name: &str) -> i64 {
        fixture
            .soldiers
            .add(Soldier::new(name, "Private", "USA", ""))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let fixture = create_fixture();
        let soldier_id = add_soldier(&fixture, "John Doe").await;
        let at = Utc.with_ymd_and_hms(2024, 6, 6, 6, 30, 0).unwrap();

        let added = fixture
            .positions
            .add(Position::new(soldier_id, 49.34, -0.62, at))
            .await
            .unwrap();
        let id = added.id.unwrap();

        let found = fixture.positions.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found, Position::new(soldier_id, 49.34, -0.62, at).with_id(id));
    }

    #[tokio::test]
    async fn test_add_for_unknown_soldier_fails() {
        let fixture = create_fixture();

        let err = fixture
            .positions
            .add(Position::now(404, 0.0, 0.0))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(fixture.positions.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_soldier_filters() {
        let fixture = create_fixture();
        let john = add_soldier(&fixture, "John Doe").await;
        let jane = add_soldier(&fixture, "Jane Smith").await;

        for i in 0..3 {
            fixture
                .positions
                .add(Position::now(john, f64::from(i), 0.0))
                .await
                .unwrap();
        }
        fixture
            .positions
            .add(Position::now(jane, 9.0, 9.0))
            .await
            .unwrap();

        let johns = fixture.positions.list_by_soldier(john).await.unwrap();
        assert_eq!(johns.len(), 3);
        assert!(johns.iter().all(|p| p.soldier_id == john));

        let janes = fixture.positions.list_by_soldier(jane).await.unwrap();
        assert_eq!(janes.len(), 1);
        assert_eq!(janes[0].soldier_id, jane);
    }

    #[tokio::test]
    async fn test_list_by_soldier_empty() {
        let fixture = create_fixture();
        let soldier_id = add_soldier(&fixture, "John Doe").await;

        assert!(fixture
            .positions
            .list_by_soldier(soldier_id)
            .await
            .unwrap()
            .is_empty());
        assert!(fixture
            .positions
            .list_by_soldier(99999)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_overwrites_every_field() {
        let fixture = create_fixture();
        let john = add_soldier(&fixture, "John Doe").await;
        let jane = add_soldier(&fixture, "Jane Smith").await;
        let id = fixture
            .positions
            .add(Position::now(john, 1.0, 1.0))
            .await
            .unwrap()
            .id
            .unwrap();

        let at = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let replacement = Position::new(jane, -33.86, 151.2, at).with_id(id);
        fixture.positions.update(replacement.clone()).await.unwrap();

        let found = fixture.positions.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found, replacement);
        assert!(fixture.positions.list_by_soldier(john).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_unknown_soldier_fails() {
        let fixture = create_fixture();
        let john = add_soldier(&fixture, "John Doe").await;
        let original = fixture
            .positions
            .add(Position::now(john, 1.0, 1.0))
            .await
            .unwrap();

        let mut moved = original.clone();
        moved.soldier_id = 777;
        let err = fixture.positions.update(moved).await.unwrap_err();
        assert!(err.is_constraint_violation());

        let found = fixture
            .positions
            .get_by_id(original.id.unwrap())
            .await
            .unwrap();
        assert_eq!(found, Some(original));
    }

    #[tokio::test]
    async fn test_unrepresentable_timestamp_keeps_listing_intact() {
        let fixture = create_fixture();
        let john = add_soldier(&fixture, "John Doe").await;
        let kept = fixture
            .positions
            .add(Position::now(john, 1.0, 1.0))
            .await
            .unwrap();

        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let err = fixture
            .positions
            .add(Position::new(john, 2.0, 2.0, far))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));

        let err = fixture
            .positions
            .update(Position::new(john, 2.0, 2.0, far).with_id(kept.id.unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));

        assert_eq!(fixture.positions.list_by_soldier(john).await.unwrap(), vec![kept.clone()]);
        assert_eq!(fixture.positions.list_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_update_without_id() {
        let fixture = create_fixture();
        let err = fixture
            .positions
            .update(Position::now(1, 0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsavedRecord { entity: "position" }));
    }

    #[tokio::test]
    async fn test_delete() {
        let fixture = create_fixture();
        let john = add_soldier(&fixture, "John Doe").await;
        let id = fixture
            .positions
            .add(Position::now(john, 1.0, 1.0))
            .await
            .unwrap()
            .id
            .unwrap();

        assert!(!fixture.positions.delete(99999).await.unwrap());
        assert!(fixture.positions.delete(id).await.unwrap());
        assert!(fixture.positions.get_by_id(id).await.unwrap().is_none());
        assert!(fixture.soldiers.get_by_id(john).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deleting_soldier_deletes_its_positions() {
        let fixture = create_fixture();
        let john = add_soldier(&fixture, "John Doe").await;
        let jane = add_soldier(&fixture, "Jane Smith").await;
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        for minutes in [0, 15, 30] {
            fixture
                .positions
                .add(Position::new(
                    john,
                    40.0,
                    -74.0,
                    start + Duration::minutes(minutes),
                ))
                .await
                .unwrap();
        }
        fixture
            .positions
            .add(Position::new(jane, 51.5, -0.1, start))
            .await
            .unwrap();
        assert_eq!(fixture.positions.list_by_soldier(john).await.unwrap().len(), 3);

        assert!(fixture.soldiers.delete(john).await.unwrap());

        // The foreign key cascades: the soldier's positions go with it.
        assert!(fixture.positions.list_by_soldier(john).await.unwrap().is_empty());
        let remaining = fixture.positions.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].soldier_id, jane);
    }
}
