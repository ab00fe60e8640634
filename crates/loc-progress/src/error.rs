//! Progress channel error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("event decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ProgressResult<T> = std::result::Result<T, ProgressError>;
