//! `s3://bucket/key` URL parsing, shared by the orchestrator (resolving a
//! job's source asset) and every stage worker (resolving the previous
//! stage's output).

use crate::error::{StorageError, StorageResult};

/// Split an `s3://bucket/key/with/slashes` URL into its bucket and key.
/// Mirrors the original `parse_s3_url` helper, including its bare
/// `bucket/key` fallback for URLs without a scheme.
pub fn parse_s3_url(url: &str) -> StorageResult<(String, String)> {
    let without_scheme = url.strip_prefix("s3://").unwrap_or(url);
    let (bucket, key) = without_scheme
        .split_once('/')
        .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
    if bucket.is_empty() || key.is_empty() {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }
    Ok((bucket.to_string(), key.trim_start_matches('/').to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3_scheme_url() {
        let (bucket, key) = parse_s3_url("s3://media-bucket/jobs/j1/fr/mix/out.mp4").unwrap();
        assert_eq!(bucket, "media-bucket");
        assert_eq!(key, "jobs/j1/fr/mix/out.mp4");
    }

    #[test]
    fn parses_bare_bucket_slash_key() {
        let (bucket, key) = parse_s3_url("media-bucket/jobs/j1/fr/asr/segments.json").unwrap();
        assert_eq!(bucket, "media-bucket");
        assert_eq!(key, "jobs/j1/fr/asr/segments.json");
    }

    #[test]
    fn rejects_url_without_key() {
        assert!(parse_s3_url("s3://media-bucket").is_err());
        assert!(parse_s3_url("s3://media-bucket/").is_err());
    }
}
