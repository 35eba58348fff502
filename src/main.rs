use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scanroute::analytics::{geo_lookup_from_config, ScanLogger, ScanRecorder};
use scanroute::config::{Config, DatabaseBackend};
use scanroute::redirect::create_redirect_router;
use scanroute::resolver::RedirectResolver;
use scanroute::storage::{CachedStorage, PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(SqliteStorage::new(&config.database.url, config.database.max_connections).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
    };

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let storage: Arc<dyn Storage> = if config.cache.max_entries > 0 {
        info!(
            "Read cache enabled: {} entries, {}s TTL",
            config.cache.max_entries, config.cache.ttl_secs
        );
        Arc::new(CachedStorage::new(
            storage,
            config.cache.max_entries,
            config.cache.ttl_secs,
        ))
    } else {
        storage
    };

    let recorder: Option<Arc<dyn ScanRecorder>> = if config.analytics.enabled {
        let geo = geo_lookup_from_config(&config.analytics);
        Some(Arc::new(ScanLogger::new(Arc::clone(&storage), geo)))
    } else {
        info!("Scan logging is disabled");
        None
    };

    let resolver = RedirectResolver::new(storage, recorder);
    let router = create_redirect_router(
        resolver,
        config.analytics.clone(),
        config.redirect_server.redirect_status_code(),
    );

    let addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Redirect server listening on http://{}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
