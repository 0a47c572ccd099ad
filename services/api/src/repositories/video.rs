//! Video catalog: the metadata ledger behind the access mediator
//!
//! The catalog is append-only. Records are created when an upload slot is
//! requested and are never updated or deleted through this interface.

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::video::VideoRecord;

/// Persistence seam for video metadata
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Allocate a fresh id and persist a record owned by `user_id`.
    ///
    /// The record is durable once this returns.
    async fn create(&self, user_id: Uuid, title: &str) -> DatabaseResult<VideoRecord>;

    /// Look up a record by id
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<VideoRecord>>;

    /// All records owned by `user_id`, in no particular order
    async fn find_by_owner(&self, user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>>;
}

/// PostgreSQL-backed catalog
#[derive(Clone)]
pub struct PgVideoCatalog {
    pool: PgPool,
}

impl PgVideoCatalog {
    /// Create a new catalog over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoCatalog for PgVideoCatalog {
    async fn create(&self, user_id: Uuid, title: &str) -> DatabaseResult<VideoRecord> {
        let record = sqlx::query_as::<_, VideoRecord>(
            r#"
            INSERT INTO videos (id, user_id, title)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<VideoRecord>> {
        sqlx::query_as::<_, VideoRecord>(
            r#"
            SELECT id, user_id, title, created_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn find_by_owner(&self, user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>> {
        sqlx::query_as::<_, VideoRecord>(
            r#"
            SELECT id, user_id, title, created_at
            FROM videos
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}

/// Process-local catalog, used where no database is available
#[derive(Default)]
pub struct InMemoryVideoCatalog {
    records: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoCatalog for InMemoryVideoCatalog {
    async fn create(&self, user_id: Uuid, title: &str) -> DatabaseResult<VideoRecord> {
        let record = VideoRecord {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            created_at: Utc::now(),
        };

        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<VideoRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_owner(&self, user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}
