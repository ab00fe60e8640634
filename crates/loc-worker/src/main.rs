//! Localization pipeline stage worker binary.
//!
//! One process, one stage — `--stage`/`$LOC_STAGE` selects which transform
//! this instance runs, matching the teacher's single-binary-many-backends
//! shape for its own executor selection. `--stage youtube` is a special
//! case: the uploader never touches object storage or the `StageWorker`
//! trait, so it runs its own standalone consumer loop instead.

use clap::Parser;
use loc_bus::MessageBus;
use loc_config::WorkerSettings;
use loc_core::pipeline::Stage;
use loc_progress::ProgressChannel;
use loc_storage::ObjectStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = WorkerSettings::parse();

    let progress = ProgressChannel::connect(&settings.common.redis_url).await?;
    let bus = MessageBus::connect(&settings.common.rabbitmq_url, 10).await?;

    if settings.stage == "youtube" {
        info!("starting youtube upload worker");
        loc_worker::youtube::run(bus, progress).await?;
        return Ok(());
    }

    let stage = Stage::from_str_opt(&settings.stage)
        .ok_or_else(|| anyhow::anyhow!("unknown stage `{}`", settings.stage))?;
    let worker = loc_worker::stages::build(stage)
        .ok_or_else(|| anyhow::anyhow!("stage `{}` has no worker", settings.stage))?;

    let storage = ObjectStore::new(
        &settings.common.s3_endpoint,
        &settings.common.s3_region,
        &settings.common.s3_bucket,
        &settings.common.s3_access_key,
        &settings.common.s3_secret_key,
    )
    .await;

    info!(stage = stage.as_str(), worker_id = ?settings.worker_id, "starting stage worker");
    loc_worker::run_worker(bus, storage, progress, worker).await?;
    Ok(())
}
