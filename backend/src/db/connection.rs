use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPool, types::Json};

use super::{DocumentStore, StoreError};

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Documents kept as JSONB rows in the `documents` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::new(create_pool(database_url).await?))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load(&self, key: &str) -> Result<Value, StoreError> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT body FROM documents WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(body,)| body.0).unwrap_or(Value::Null))
    }

    async fn save(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (key, body, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()",
        )
        .bind(key)
        .bind(Json(document))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
