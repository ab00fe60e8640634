//! The fixed localization stage pipeline and its skip rules.

use serde::{Deserialize, Serialize};

use crate::domain::JobOptions;

/// One stage in the fixed localization pipeline.
///
/// Order is significant: this is the only order stages ever run in. `Pack`
/// has no worker of its own — it is the terminal marker a variant reaches
/// once `qc` has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Asr,
    Translate,
    Tts,
    Mix,
    Subs,
    Textinframe,
    Qc,
    Pack,
}

/// The fixed stage order. Never reordered, never configured at runtime.
pub const PIPELINE: &[Stage] = &[
    Stage::Asr,
    Stage::Translate,
    Stage::Tts,
    Stage::Mix,
    Stage::Subs,
    Stage::Textinframe,
    Stage::Qc,
    Stage::Pack,
];

impl Stage {
    /// The lowercase wire/queue name for this stage (`stage.<name>`).
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Asr => "asr",
            Stage::Translate => "translate",
            Stage::Tts => "tts",
            Stage::Mix => "mix",
            Stage::Subs => "subs",
            Stage::Textinframe => "textinframe",
            Stage::Qc => "qc",
            Stage::Pack => "pack",
        }
    }

    /// Parse a stage from its wire name. Unknown names are rejected rather
    /// than silently mapped to a default — a typo'd stage name in a
    /// redelivered message should never be mistaken for a real stage.
    pub fn from_str_opt(s: &str) -> Option<Stage> {
        PIPELINE.iter().copied().find(|stage| stage.as_str() == s)
    }

    fn index(self) -> usize {
        PIPELINE
            .iter()
            .position(|&s| s == self)
            .expect("Stage::index: PIPELINE must contain every Stage variant")
    }
}

/// Whether `stage` should be bypassed entirely for a job with the given
/// options, emitting a `skipped` progress event instead of dispatching
/// work to a queue.
///
/// `asr`, `translate`, `mix`, `qc`, and `pack` always run; `tts` is gated
/// on `dub`, `subs` on `subs`, and `textinframe` on `replace_text_in_frame`.
pub fn should_skip(stage: Stage, options: &JobOptions) -> bool {
    match stage {
        Stage::Tts => !options.dub,
        Stage::Subs => !options.subs,
        Stage::Textinframe => !options.replace_text_in_frame,
        Stage::Asr | Stage::Translate | Stage::Mix | Stage::Qc | Stage::Pack => false,
    }
}

/// Walk forward from `current` to the next stage that is not skipped for
/// `options`, returning `None` once the pipeline is exhausted (the variant
/// is done).
pub fn next_stage(current: Stage, options: &JobOptions) -> Option<Stage> {
    let mut idx = current.index() + 1;
    while let Some(&stage) = PIPELINE.get(idx) {
        if stage == Stage::Pack {
            return None;
        }
        if !should_skip(stage, options) {
            return Some(stage);
        }
        idx += 1;
    }
    None
}

/// The stages strictly between `current` and `next_stage(current, options)`
/// that were bypassed to get there, in pipeline order. The orchestrator
/// emits one `skipped` progress event per entry before emitting `queued`
/// for the stage `next_stage` actually returned.
pub fn skipped_between(current: Stage, options: &JobOptions) -> Vec<Stage> {
    let mut out = Vec::new();
    let mut idx = current.index() + 1;
    while let Some(&stage) = PIPELINE.get(idx) {
        if stage == Stage::Pack || !should_skip(stage, options) {
            break;
        }
        out.push(stage);
        idx += 1;
    }
    out
}

/// The first stage a freshly created variant enters, honoring skip rules
/// (a job with every optional stage disabled still always starts at `asr`).
pub fn first_stage(options: &JobOptions) -> Stage {
    PIPELINE
        .iter()
        .copied()
        .find(|&stage| stage != Stage::Pack && !should_skip(stage, options))
        .unwrap_or(Stage::Asr)
}

/// The deterministic object key prefix for an artifact produced by `stage`
/// within `base_prefix` (itself `jobs/<job_id>/<lang>`).
pub fn stage_key(base_prefix: &str, stage: Stage, artifact: &str) -> String {
    format!("{base_prefix}/{}/{artifact}", stage.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(dub: bool, subs: bool, textinframe: bool) -> JobOptions {
        JobOptions {
            dub,
            subs,
            replace_text_in_frame: textinframe,
            upload_to_youtube: false,
        }
    }

    #[test]
    fn full_pipeline_visits_every_optional_stage() {
        let options = opts(true, true, true);
        let mut stage = first_stage(&options);
        let mut seen = vec![stage];
        while let Some(next) = next_stage(stage, &options) {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![
                Stage::Asr,
                Stage::Translate,
                Stage::Tts,
                Stage::Mix,
                Stage::Subs,
                Stage::Textinframe,
                Stage::Qc,
            ]
        );
    }

    #[test]
    fn minimal_pipeline_skips_every_optional_stage() {
        let options = opts(false, false, false);
        let mut stage = first_stage(&options);
        let mut seen = vec![stage];
        while let Some(next) = next_stage(stage, &options) {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![Stage::Asr, Stage::Translate, Stage::Mix, Stage::Qc]
        );
    }

    #[test]
    fn qc_is_always_last_before_pack() {
        let options = opts(true, false, true);
        assert_eq!(next_stage(Stage::Qc, &options), None);
    }

    #[test]
    fn stage_name_round_trips() {
        for &stage in PIPELINE {
            assert_eq!(Stage::from_str_opt(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_str_opt("bogus"), None);
    }

    #[test]
    fn skipped_between_lists_every_bypassed_stage_in_order() {
        let options = opts(false, false, false);
        assert_eq!(
            skipped_between(Stage::Mix, &options),
            vec![Stage::Subs, Stage::Textinframe]
        );
        assert_eq!(skipped_between(Stage::Asr, &options), Vec::<Stage>::new());
    }

    #[test]
    fn stage_key_is_deterministic() {
        let a = stage_key("jobs/j1/fr", Stage::Mix, "out.mp4");
        let b = stage_key("jobs/j1/fr", Stage::Mix, "out.mp4");
        assert_eq!(a, b);
        assert_eq!(a, "jobs/j1/fr/mix/out.mp4");
    }
}
