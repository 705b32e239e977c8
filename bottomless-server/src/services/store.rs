use std::sync::Arc;
use serde_json::Value;
use crate::db::repo::StoreRepo;
use crate::error::AppResult;
use crate::models::inventory::UnboundedStore;
use crate::models::types::OwnerId;
use crate::services::persistence::StorePersistence;

pub struct StoreService {
    repo: Arc<dyn StoreRepo>,
}

impl StoreService {
    pub fn new(repo: Arc<dyn StoreRepo>) -> Self {
        Self { repo }
    }

    /// Load the owner's store. Unreadable data degrades to an empty or partial
    /// store; only repository failures are errors.
    pub async fn load(&self, owner: OwnerId) -> AppResult<UnboundedStore> {
        let record = self.repo.load_record(owner).await?;
        let (store, report) = StorePersistence::decode_with_report(record.as_ref());
        tracing::debug!(%owner, loaded = report.loaded, skipped = report.skipped, "store loaded");
        Ok(store)
    }

    pub async fn save(&self, owner: OwnerId, store: &UnboundedStore) -> AppResult<()> {
        self.save_record(owner, StorePersistence::encode(store)).await
    }

    /// Write an already encoded record, for callers that must not hold the
    /// store across an await.
    pub async fn save_record(&self, owner: OwnerId, record: Value) -> AppResult<()> {
        self.repo.save_record(owner, &record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bottomless_core::{ItemStack, ItemTypeId};
    use crate::db::repo::MemoryStoreRepo;

    #[tokio::test]
    async fn unknown_owner_loads_empty() {
        let service = StoreService::new(Arc::new(MemoryStoreRepo::new()));
        assert!(service.load(OwnerId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let service = StoreService::new(Arc::new(MemoryStoreRepo::new()));
        let owner = OwnerId::new();
        let gravel = ItemStack::new(ItemTypeId::parse("minecraft:gravel").unwrap(), 1);

        let mut store = UnboundedStore::new();
        store.add_item(&gravel, 5_000);
        service.save(owner, &store).await.unwrap();

        let loaded = service.load(owner).await.unwrap();
        assert_eq!(loaded.count(&gravel), 5_000);
    }
}
