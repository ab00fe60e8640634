//! Event-driven orchestrator for the localization pipeline.
//!
//! Consumes `job.created` and every stage's `stage.<name>.completed` /
//! `stage.<name>.failed` events, advances each variant through the fixed
//! stage sequence in `loc_core::pipeline`, and fires the post-pipeline
//! YouTube upload hook once a job finishes. The database's
//! `current_stage`-guarded updates (see `loc_db::repo::job`) make every
//! handler idempotent against redelivery and sibling-variant races.

pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod ports;

pub use error::{OrchestratorError, OrchestratorResult};
pub use handlers::Orchestrator;
pub use locks::JobLocks;
pub use ports::{Publisher, ProgressSink};
