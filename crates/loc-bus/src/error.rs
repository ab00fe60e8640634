//! Message bus error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("message decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BusResult<T> = std::result::Result<T, BusError>;
