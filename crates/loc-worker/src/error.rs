//! Stage processing error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("storage error: {0}")]
    Storage(#[from] loc_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("subprocess `{command}` failed: {detail}")]
    Subprocess { command: String, detail: String },

    #[error("stage panicked")]
    Panicked,
}

pub type StageResult<T> = std::result::Result<T, StageError>;
