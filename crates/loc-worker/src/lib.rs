//! Stage worker harness.
//!
//! One process per stage (selected by `--stage`/`$LOC_STAGE`), each
//! binding a competing consumer to `stage.<name>` and publishing a
//! `StageResult` to `stage.<name>.completed` or `.failed` once its
//! transform finishes. The media transforms themselves (`stages::*`) are
//! thin, ffmpeg/ffprobe-backed stand-ins — the part under test is the
//! runner's ack discipline and deterministic output keying, not the
//! transforms.

pub mod context;
pub mod error;
pub mod runner;
pub mod stages;
pub mod youtube;

pub use context::WorkerContext;
pub use error::{StageError, StageResult};
pub use runner::run_worker;

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::Stage;

/// The outputs one stage run may produce. Every field is optional —
/// `StageResult` on the wire only ever sets the columns this stage
/// actually writes (spec's enumerated per-stage outputs).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StageOutputs {
    pub video_key: Option<String>,
    pub audio_key: Option<String>,
    pub subs_key: Option<String>,
    pub preview_key: Option<String>,
    pub report: Option<serde_json::Value>,
}

/// One concrete stage transform. Implementations do not touch the
/// database or the bus directly — the runner owns ack/nack, tempdir
/// scoping, and publishing the result envelope.
#[async_trait]
pub trait StageWorker: Send + Sync {
    fn stage(&self) -> Stage;

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs>;
}
