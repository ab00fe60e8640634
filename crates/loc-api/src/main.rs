//! Localization pipeline API server.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use loc_api::AppState;
use loc_api::routes;
use loc_bus::MessageBus;
use loc_config::ApiSettings;
use loc_db::PgJobRepo;
use loc_progress::ProgressChannel;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = ApiSettings::parse();

    info!("connecting to database...");
    let pool = loc_db::create_pool(&settings.common.postgres_dsn).await?;
    loc_db::run_migrations(&pool).await?;
    info!("database connected");

    let progress = ProgressChannel::connect(&settings.common.redis_url).await?;
    let bus = MessageBus::connect(&settings.common.rabbitmq_url, 10).await?;

    let state = AppState {
        jobs: Arc::new(PgJobRepo::new(pool.clone())),
        pool,
        bus,
        progress,
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "starting api server");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
