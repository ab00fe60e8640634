//! Settings structs, one per binary surface, all sharing the same
//! `#[arg(long, env = "...")]` pattern.

use clap::Parser;

/// Infrastructure endpoints every service needs, flattened into each
/// binary's own settings struct with `#[command(flatten)]`.
#[derive(Debug, Clone, Parser)]
pub struct CommonSettings {
    #[arg(long, env = "POSTGRES_DSN")]
    pub postgres_dsn: String,

    #[arg(long, env = "REDIS_URL")]
    pub redis_url: String,

    #[arg(long, env = "RABBITMQ_URL")]
    pub rabbitmq_url: String,

    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: String,

    #[arg(long, env = "S3_REGION", default_value = "eu-central-1")]
    pub s3_region: String,

    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: String,

    #[arg(long, env = "S3_ACCESS_KEY")]
    pub s3_access_key: String,

    #[arg(long, env = "S3_SECRET_KEY")]
    pub s3_secret_key: String,
}

/// Settings for the `loc-api` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "loc-api", about = "Localization pipeline REST/SSE façade")]
pub struct ApiSettings {
    #[command(flatten)]
    pub common: CommonSettings,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: String,
}

/// Settings for the `loc-orchestrator` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "loc-orchestrator", about = "Localization pipeline orchestrator")]
pub struct OrchestratorSettings {
    #[command(flatten)]
    pub common: CommonSettings,
}

/// Settings for one `loc-worker` process. `--stage` (or `$LOC_STAGE`)
/// selects which concrete stage module this process runs; a single binary
/// serves every stage, matching the teacher's single-binary-many-backends
/// shape for its executor selection.
#[derive(Debug, Clone, Parser)]
#[command(name = "loc-worker", about = "Localization pipeline stage worker")]
pub struct WorkerSettings {
    #[command(flatten)]
    pub common: CommonSettings,

    #[arg(long, env = "LOC_STAGE")]
    pub stage: String,

    #[arg(long, env = "WORKER_ID")]
    pub worker_id: Option<String>,
}
