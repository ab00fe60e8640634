//! REST/SSE façade for the localization pipeline.
//!
//! Job creation (seeds a job and its variants, publishes `job.created`),
//! job/variant reads, an SSE progress relay over [`loc_progress`], and a
//! health check.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;
