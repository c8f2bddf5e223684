//! Plan persistence boundary
//!
//! `PlanStore` is what the planner needs from persistence: CRUD on saved
//! plans plus listing by owner. `LocalPlanStore` keeps them in a `planstore`
//! JSONL collection on disk.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use planstore::{Filter, IndexValue, Store};
use tracing::{debug, info};

use crate::domain::{Itinerary, SavedPlan, normalize_email};
use crate::error::PlannerError;

/// Saved-plan persistence
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Save a new plan for `email`
    async fn create(&self, email: &str, plan: &Itinerary) -> Result<SavedPlan, PlannerError>;

    async fn get(&self, id: &str) -> Result<SavedPlan, PlannerError>;

    /// Replace the itinerary content of an existing plan
    async fn update(&self, id: &str, plan: &Itinerary) -> Result<SavedPlan, PlannerError>;

    async fn delete(&self, id: &str) -> Result<(), PlannerError>;

    /// Plans owned by `email`, newest first
    async fn list_by_owner(&self, email: &str) -> Result<Vec<SavedPlan>, PlannerError>;
}

/// File-backed plan store
///
/// Store IO is synchronous and file-locked, so every operation runs on the
/// blocking pool.
#[derive(Clone)]
pub struct LocalPlanStore {
    store: Arc<Mutex<Store>>,
}

impl LocalPlanStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        debug!(path = %path.as_ref().display(), "LocalPlanStore::open: called");
        let store = Store::open(path).map_err(persistence)?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
        })
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T, PlannerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Store) -> Result<T, PlannerError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|_| PlannerError::PersistenceFailure("plan store lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| PlannerError::PersistenceFailure(e.to_string()))?
    }
}

fn persistence(err: eyre::Report) -> PlannerError {
    PlannerError::PersistenceFailure(format!("{:#}", err))
}

#[async_trait]
impl PlanStore for LocalPlanStore {
    async fn create(&self, email: &str, plan: &Itinerary) -> Result<SavedPlan, PlannerError> {
        debug!(%email, title = %plan.title, "LocalPlanStore::create: called");
        let saved = SavedPlan::new(email, plan.clone());
        let record = saved.clone();
        self.with_store(move |store| store.create(record).map_err(persistence)).await?;
        info!(id = %saved.id, owner = %saved.user_email, "Saved plan");
        Ok(saved)
    }

    async fn get(&self, id: &str) -> Result<SavedPlan, PlannerError> {
        debug!(%id, "LocalPlanStore::get: called");
        let key = id.to_string();
        self.with_store(move |store| {
            store
                .get::<SavedPlan>(&key)
                .map_err(persistence)?
                .ok_or(PlannerError::PlanNotFound(key))
        })
        .await
    }

    async fn update(&self, id: &str, plan: &Itinerary) -> Result<SavedPlan, PlannerError> {
        debug!(%id, "LocalPlanStore::update: called");
        let key = id.to_string();
        let plan = plan.clone();
        let saved = self
            .with_store(move |store| {
                let existing = store
                    .get::<SavedPlan>(&key)
                    .map_err(persistence)?
                    .ok_or_else(|| PlannerError::PlanNotFound(key.clone()))?;
                let updated = existing.with_plan(plan);
                store.update(updated.clone()).map_err(persistence)?;
                Ok(updated)
            })
            .await?;
        info!(id = %saved.id, "Updated plan");
        Ok(saved)
    }

    async fn delete(&self, id: &str) -> Result<(), PlannerError> {
        debug!(%id, "LocalPlanStore::delete: called");
        let key = id.to_string();
        self.with_store(move |store| {
            if store.delete::<SavedPlan>(&key).map_err(persistence)? {
                Ok(())
            } else {
                Err(PlannerError::PlanNotFound(key))
            }
        })
        .await?;
        info!(%id, "Deleted plan");
        Ok(())
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<SavedPlan>, PlannerError> {
        let owner = normalize_email(email);
        debug!(%owner, "LocalPlanStore::list_by_owner: called");
        let mut plans = self
            .with_store(move |store| {
                store
                    .list::<SavedPlan>(&[Filter::eq("userEmail", IndexValue::String(owner))])
                    .map_err(persistence)
            })
            .await?;
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;
    use tempfile::TempDir;

    fn open() -> (TempDir, LocalPlanStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalPlanStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, store) = open();
        let saved = store.create("Asha@Example.com", &fixtures::itinerary()).await.unwrap();
        assert_eq!(saved.user_email, "asha@example.com");

        let loaded = store.get(&saved.id).await.unwrap();
        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.plan.title, "Gurugram Getaway");
        assert_eq!(loaded.plan.itinerary.len(), 3);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = open();
        assert!(matches!(store.get("nope").await, Err(PlannerError::PlanNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let (_dir, store) = open();
        let saved = store.create("a@b.com", &fixtures::itinerary()).await.unwrap();

        let mut plan = saved.plan.clone();
        plan.title = "Calmer Getaway".to_string();
        let updated = store.update(&saved.id, &plan).await.unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.created_at, saved.created_at);
        assert!(updated.updated_at >= saved.updated_at);
        assert_eq!(store.get(&saved.id).await.unwrap().plan.title, "Calmer Getaway");

        assert!(matches!(
            store.update("missing", &plan).await,
            Err(PlannerError::PlanNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, store) = open();
        let saved = store.create("a@b.com", &fixtures::itinerary()).await.unwrap();
        store.delete(&saved.id).await.unwrap();
        assert!(matches!(store.get(&saved.id).await, Err(PlannerError::PlanNotFound(_))));
        assert!(matches!(store.delete(&saved.id).await, Err(PlannerError::PlanNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let (_dir, store) = open();
        let first = store.create("a@b.com", &fixtures::itinerary()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create(" A@B.com ", &fixtures::itinerary()).await.unwrap();
        store.create("other@b.com", &fixtures::itinerary()).await.unwrap();

        let plans = store.list_by_owner("a@b.com").await.unwrap();
        let ids: Vec<_> = plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }
}
