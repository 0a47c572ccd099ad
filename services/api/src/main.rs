use std::sync::Arc;

use anyhow::Result;
use common::database::{DatabaseConfig, health_check, init_pool};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use video_service::{
    access::AccessMediator,
    config::ServerConfig,
    middleware::{JwtConfig, JwtVerifier},
    repositories::{PgVideoCatalog, run_migrations},
    routes,
    state::AppState,
    storage::{S3CapabilitySigner, StorageConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting video service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Object store signer and token verifier
    let storage_config = StorageConfig::from_env()?;
    let signer = S3CapabilitySigner::from_config(&storage_config).await;
    let jwt_verifier = JwtVerifier::new(&JwtConfig::from_env()?)?;

    let mediator = AccessMediator::new(Arc::new(PgVideoCatalog::new(pool)), Arc::new(signer));

    let app_state = AppState {
        mediator: Arc::new(mediator),
        jwt_verifier,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let server_config = ServerConfig::from_env()?;
    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Video service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
