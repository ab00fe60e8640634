//! Error type for the orchestrator core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Db(#[from] loc_db::DbError),

    #[error(transparent)]
    Bus(#[from] loc_bus::BusError),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;
