use crate::db::DbResult;
use crate::models::types::OwnerId;
use serde_json::Value;

/// Durable home of one persisted store record per owner.
///
/// Records are opaque here; encoding and decoding live in `StorePersistence`.
#[async_trait::async_trait]
pub trait StoreRepo: Send + Sync {
    async fn load_record(&self, owner: OwnerId) -> DbResult<Option<Value>>;
    async fn save_record(&self, owner: OwnerId, record: &Value) -> DbResult<()>;
}
