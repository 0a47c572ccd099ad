//! Repositories for database operations

use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;

pub mod video;

pub use video::{InMemoryVideoCatalog, PgVideoCatalog, VideoCatalog};

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
