//! Shared per-invocation context: object storage handle and a scratch
//! directory, plus the small file/process helpers every stage leans on.

use std::path::{Path, PathBuf};

use loc_storage::{ObjectStore, parse_s3_url};
use tokio::process::Command;

use crate::error::{StageError, StageResult};

pub struct WorkerContext<'a> {
    pub storage: &'a ObjectStore,
    pub workdir: &'a Path,
}

impl<'a> WorkerContext<'a> {
    pub fn path(&self, name: &str) -> PathBuf {
        self.workdir.join(name)
    }

    /// Download an `s3://bucket/key` (or bare `bucket/key`) URL's object
    /// into `dest`, ignoring any bucket mismatch against this store's own
    /// bucket — every job shares one configured bucket in practice.
    pub async fn download_url(&self, url: &str, dest: &Path) -> StageResult<()> {
        let (_, key) = parse_s3_url(url)?;
        self.storage.download_file(&key, dest).await?;
        Ok(())
    }

    pub async fn download_key(&self, key: &str, dest: &Path) -> StageResult<()> {
        self.storage.download_file(key, dest).await?;
        Ok(())
    }

    pub async fn upload_file(&self, key: &str, path: &Path) -> StageResult<String> {
        Ok(self.storage.upload_file(key, path).await?)
    }

    pub async fn upload_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StageResult<String> {
        Ok(self
            .storage
            .upload_bytes(key, bytes.into(), content_type)
            .await?)
    }
}

/// Run a subprocess to completion, mapping a non-zero exit or spawn
/// failure into [`StageError::Subprocess`]. Stdout/stderr are captured
/// only for the error message — stages that need the output parse it
/// from a file `ffmpeg`/`ffprobe` was told to write instead.
pub async fn run_command(mut command: Command) -> StageResult<()> {
    let program = format!("{command:?}");
    let output = command.output().await.map_err(|e| StageError::Subprocess {
        command: program.clone(),
        detail: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(StageError::Subprocess {
            command: program,
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// `ffprobe -v error -show_entries format=duration -of csv=p=0 <path>`,
/// parsed as a float number of seconds. Falls back to `0.0` if ffprobe's
/// output doesn't parse, rather than failing the stage over a malformed
/// demo asset.
pub async fn probe_duration_seconds(path: &Path) -> StageResult<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| StageError::Subprocess {
            command: "ffprobe".to_string(),
            detail: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(StageError::Subprocess {
            command: "ffprobe".to_string(),
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(text.trim().parse().unwrap_or(0.0))
}
