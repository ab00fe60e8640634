//! Localization pipeline orchestrator binary.

use std::sync::Arc;

use clap::Parser;
use loc_bus::MessageBus;
use loc_config::OrchestratorSettings;
use loc_db::{PgAssetRepo, PgJobRepo, PgVoiceProfileRepo};
use loc_orchestrator::{JobLocks, Orchestrator, dispatch};
use loc_progress::ProgressChannel;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = OrchestratorSettings::parse();

    info!("connecting to database...");
    let pool = loc_db::create_pool(&settings.common.postgres_dsn).await?;
    loc_db::run_migrations(&pool).await?;
    info!("database connected");

    let progress = ProgressChannel::connect(&settings.common.redis_url).await?;
    let bus = MessageBus::connect(&settings.common.rabbitmq_url, 10).await?;
    dispatch::declare_queues(&bus).await?;

    let orchestrator = Arc::new(Orchestrator {
        jobs: Arc::new(PgJobRepo::new(pool.clone())),
        assets: Arc::new(PgAssetRepo::new(pool.clone())),
        voice_profiles: Arc::new(PgVoiceProfileRepo::new(pool)),
        publisher: Arc::new(bus.clone()),
        progress: Arc::new(progress),
        locks: JobLocks::new(),
    });

    info!("orchestrator consuming job.created and stage completion events");
    dispatch::run(bus, orchestrator).await?;
    Ok(())
}
