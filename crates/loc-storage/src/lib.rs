//! Object storage client.
//!
//! Wraps `aws-sdk-s3` against any S3-compatible endpoint (including
//! path-style MinIO deployments used in development), mirroring the
//! original `S3Storage` helper's put/get/exists surface and the
//! deterministic `jobs/<job_id>/<lang>/<stage>/<artifact>` key layout
//! every stage worker writes under.

mod error;
mod keys;

pub use error::{StorageError, StorageResult};
pub use keys::parse_s3_url;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::TryStreamExt;

/// A thin S3 client bound to one bucket.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    /// Build a client against `endpoint` (path-style, for MinIO/dev use)
    /// using static credentials, matching the original's explicit
    /// `aws_access_key_id`/`aws_secret_access_key`/`endpoint_url` boto3
    /// client construction.
    pub async fn new(
        endpoint: &str,
        region: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "loc-storage",
        );
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.to_string(),
        }
    }

    /// Upload raw bytes to `key` under this store's bucket.
    pub async fn upload_bytes(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;
        Ok(format!("s3://{}/{key}", self.bucket))
    }

    /// Upload a local file to `key`, sniffing content type from its
    /// extension the way the original picks m3u8 vs ts/mp4 content types.
    pub async fn upload_file(&self, key: &str, path: &std::path::Path) -> StorageResult<String> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;
        let content_type = guess_content_type(key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;
        Ok(format!("s3://{}/{key}", self.bucket))
    }

    /// Download `key` to a local file.
    pub async fn download_file(&self, key: &str, path: &std::path::Path) -> StorageResult<()> {
        let mut object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?;
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?;
        use tokio::io::AsyncWriteExt;
        while let Some(chunk) = object
            .body
            .try_next()
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| StorageError::Download(e.to_string()))?;
        }
        Ok(())
    }

    /// Whether `key` exists in this store's bucket, via `head_object`.
    pub async fn object_exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(StorageError::Download(err.to_string()))
                }
            }
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn guess_content_type(key: &str) -> &'static str {
    if key.ends_with(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else if key.ends_with(".ts") {
        "video/mp2t"
    } else if key.ends_with(".mp4") {
        "video/mp4"
    } else if key.ends_with(".wav") {
        "audio/wav"
    } else if key.ends_with(".srt") {
        "application/x-subrip"
    } else if key.ends_with(".vtt") {
        "text/vtt"
    } else if key.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}
