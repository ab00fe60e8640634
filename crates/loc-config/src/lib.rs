//! Environment-driven settings for every binary in the localization
//! pipeline (`loc-api`, `loc-orchestrator`, the stage workers in
//! `loc-worker`).
//!
//! Every field is `clap::Parser`-derived with an `env` fallback, the same
//! idiom the teacher's CLI uses for its own flags — so every setting can
//! be passed as a flag locally or an environment variable in a container.

pub mod settings;

pub use settings::{ApiSettings, OrchestratorSettings, WorkerSettings};
