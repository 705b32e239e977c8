use crate::db::DbResult;
use crate::db::repo::store::StoreRepo;
use crate::models::types::OwnerId;
use dashmap::DashMap;
use serde_json::Value;

/// Process-local repository. Used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryStoreRepo {
    records: DashMap<OwnerId, Value>,
}

impl MemoryStoreRepo {
    pub fn new() -> Self {
        Self { records: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl StoreRepo for MemoryStoreRepo {
    async fn load_record(&self, owner: OwnerId) -> DbResult<Option<Value>> {
        Ok(self.records.get(&owner).map(|r| r.value().clone()))
    }

    async fn save_record(&self, owner: OwnerId, record: &Value) -> DbResult<()> {
        self.records.insert(owner, record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let repo = MemoryStoreRepo::new();
        let owner = OwnerId::new();
        assert!(repo.load_record(owner).await.unwrap().is_none());

        repo.save_record(owner, &json!({ "Version": 1, "Items": [] })).await.unwrap();
        repo.save_record(owner, &json!({ "Version": 1, "Items": [1] })).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.load_record(owner).await.unwrap(), Some(json!({ "Version": 1, "Items": [1] })));
    }
}
