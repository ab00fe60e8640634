//! Shared application state.

use std::sync::Arc;

use loc_bus::MessageBus;
use loc_db::JobRepo;
use loc_progress::ProgressChannel;
use sqlx::PgPool;

/// Asset and voice-profile rows are only ever read by the orchestrator
/// (resolving a job's source asset, or erroring it when one is missing);
/// the API only needs the job repository and the bus/progress handles to
/// create jobs and relay their progress.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jobs: Arc<dyn JobRepo>,
    pub bus: MessageBus,
    pub progress: ProgressChannel,
}
