use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("invalid s3 url: {0}")]
    InvalidUrl(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
