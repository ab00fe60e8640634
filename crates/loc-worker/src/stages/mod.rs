//! One module per concrete stage transform, each a thin ffmpeg/ffprobe
//! shell exactly in the spirit of the original Python agents: the
//! pipeline orchestration is what is tested and real, these are the
//! thinnest correct implementation of the actual media work.

pub mod asr;
pub mod mix;
pub mod qc;
pub mod subs;
pub mod textinframe;
pub mod translate;
pub mod tts;

use std::sync::Arc;

use loc_core::pipeline::Stage;

use crate::StageWorker;

/// Build the worker for `stage`, or `None` for `Pack` (a terminal marker
/// with no worker of its own).
pub fn build(stage: Stage) -> Option<Arc<dyn StageWorker>> {
    match stage {
        Stage::Asr => Some(Arc::new(asr::AsrWorker)),
        Stage::Translate => Some(Arc::new(translate::TranslateWorker)),
        Stage::Tts => Some(Arc::new(tts::TtsWorker)),
        Stage::Mix => Some(Arc::new(mix::MixWorker)),
        Stage::Subs => Some(Arc::new(subs::SubsWorker)),
        Stage::Textinframe => Some(Arc::new(textinframe::TextinframeWorker)),
        Stage::Qc => Some(Arc::new(qc::QcWorker)),
        Stage::Pack => None,
    }
}
