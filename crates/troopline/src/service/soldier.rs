use async_trait::async_trait;
use tracing::debug;

use crate::entity::Soldier;
use crate::error::{Error, Result};
use crate::storage::Database;

use super::{saved_id, SoldierService};

/// [`SoldierService`] backed by a [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteSoldierService {
    db: Database,
}

impl SqliteSoldierService {
    /// Create a service over the given database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SoldierService for SqliteSoldierService {
    async fn list_all(&self) -> Result<Vec<Soldier>> {
        self.db.run(|uow| uow.soldiers().all()).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Soldier>> {
        self.db.run(move |uow| uow.soldiers().find(id)).await
    }

    async fn add(&self, mut soldier: Soldier) -> Result<Soldier> {
        let record = soldier.clone();
        let id = self
            .db
            .run(move |uow| {
                let key = uow.add_soldier(record);
                saved_id(&uow.save_changes()?, key)
            })
            .await?;

        debug!("Added soldier {}", id);
        soldier.id = Some(id);
        Ok(soldier)
    }

    async fn update(&self, soldier: Soldier) -> Result<Soldier> {
        let Some(id) = soldier.id else {
            return Err(Error::UnsavedRecord { entity: "soldier" });
        };

        let record = soldier.clone();
        self.db
            .run(move |uow| {
                uow.update_soldier(record)?;
                uow.save_changes().map(|_| ())
            })
            .await?;

        debug!("Updated soldier {}", id);
        Ok(soldier)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self
            .db
            .run(move |uow| {
                if uow.soldiers().find(id)?.is_none() {
                    return Ok(false);
                }
                uow.remove_soldier(id);
                uow.save_changes()?;
                Ok(true)
            })
            .await?;

        if deleted {
            debug!("Deleted soldier {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> SqliteSoldierService {
        SqliteSoldierService::new(Database::open_in_memory().expect("failed to create test database"))
    }

    fn john() -> Soldier {
        Soldier::new("John Doe", "Private", "USA", "Basic training")
    }

    fn jane() -> Soldier {
        Soldier::new("Jane Smith", "Sergeant", "UK", "Advanced training")
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let service = create_test_service();

        let added = service.add(john()).await.unwrap();
        let id = added.id.expect("id assigned");

        let found = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found, john().with_id(id));
    }

    #[tokio::test]
    async fn test_add_ignores_supplied_id() {
        let service = create_test_service();

        let added = service.add(john().with_id(999)).await.unwrap();
        assert_ne!(added.id, Some(999));
        assert!(service.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let service = create_test_service();
        assert!(service.get_by_id(99999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_leaves_store_unchanged() {
        let service = create_test_service();
        service.add(john()).await.unwrap();

        assert!(!service.delete(99999).await.unwrap());
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_existing() {
        let service = create_test_service();
        let id = service.add(john()).await.unwrap().id.unwrap();

        assert!(service.delete(id).await.unwrap());
        assert!(service.get_by_id(id).await.unwrap().is_none());
        assert!(!service.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_overwrites_every_field() {
        let service = create_test_service();
        let id = service.add(john()).await.unwrap().id.unwrap();

        let replacement = Soldier::new("Johnny Doe", "Corporal", "Canada", "").with_id(id);
        let updated = service.update(replacement.clone()).await.unwrap();
        assert_eq!(updated, replacement);

        let found = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found, replacement);
        assert_eq!(found.training_info, "");
    }

    #[tokio::test]
    async fn test_update_without_id() {
        let service = create_test_service();
        let err = service.update(john()).await.unwrap_err();
        assert!(matches!(err, Error::UnsavedRecord { entity: "soldier" }));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let service = create_test_service();
        let err = service.update(john().with_id(31)).await.unwrap_err();
        assert!(err.is_record_missing());
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_add_delete_scenario() {
        let service = create_test_service();
        assert!(service.list_all().await.unwrap().is_empty());

        let first = service
            .add(Soldier::new("John Doe", "Private", "USA", ""))
            .await
            .unwrap();
        service
            .add(Soldier::new("Jane Smith", "Sergeant", "UK", ""))
            .await
            .unwrap();
        assert_eq!(service.list_all().await.unwrap().len(), 2);

        assert!(service.delete(first.id.unwrap()).await.unwrap());

        let remaining = service.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Jane Smith");
        assert_eq!(remaining[0].rank, "Sergeant");
        assert_eq!(remaining[0].country, "UK");
    }

    #[tokio::test]
    async fn test_concurrent_adds_get_distinct_ids() {
        let service = create_test_service();

        let (a, b) = tokio::join!(service.add(john()), service.add(jane()));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.id, b.id);
        assert_eq!(service.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unicode_fields() {
        let service = create_test_service();
        let soldier = Soldier::new("Zoë Ångström", "Caporal-chef", "Française", "Pará");

        let id = service.add(soldier.clone()).await.unwrap().id.unwrap();
        assert_eq!(service.get_by_id(id).await.unwrap(), Some(soldier.with_id(id)));
    }
}
