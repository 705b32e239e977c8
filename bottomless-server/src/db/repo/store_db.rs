use crate::db::error::DbError;
use crate::db::repo::store::StoreRepo;
use crate::db::{Db, DbResult};
use crate::models::types::OwnerId;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

pub struct StoreRepository {
    db: Arc<Db>,
}

impl StoreRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl StoreRepo for StoreRepository {
    async fn load_record(&self, owner: OwnerId) -> DbResult<Option<Value>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
            SELECT record
            FROM bottomless_stores
            WHERE owner_id = $1
            "#,
            )
            .await?;

        let row_opt = client.query_opt(&stmt, &[&owner]).await?;
        row_opt
            .map(|row| row.try_get::<_, Value>("record").map_err(|e| DbError::Decode(e.to_string())))
            .transpose()
    }

    async fn save_record(&self, owner: OwnerId, record: &Value) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
            INSERT INTO bottomless_stores (owner_id, record, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id)
            DO UPDATE SET record = EXCLUDED.record, updated_at = EXCLUDED.updated_at
            "#,
            )
            .await?;

        client.execute(&stmt, &[&owner, record, &Utc::now()]).await?;
        Ok(())
    }
}
