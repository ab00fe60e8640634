//! Operator CLI for the localization pipeline API.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "loc")]
#[command(about = "Localization pipeline operator CLI", long_about = None)]
struct Cli {
    /// loc-api base URL
    #[arg(long, env = "LOC_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a job and fan it out into one variant per language
    CreateJob {
        /// Owning project id
        #[arg(long)]
        project_id: String,
        /// Source asset id
        #[arg(long)]
        source_asset_id: String,
        /// Voice profile id, if dubbing with a specific voice
        #[arg(long)]
        voice_profile_id: Option<String>,
        /// Target language tags, comma-separated (e.g. de,fr)
        #[arg(long, value_delimiter = ',')]
        languages: Vec<String>,
        /// Skip the tts/mix dub track
        #[arg(long)]
        no_dub: bool,
        /// Skip subtitle generation
        #[arg(long)]
        no_subs: bool,
        /// Burn localized text into frame
        #[arg(long)]
        replace_text_in_frame: bool,
        /// Fire the post-pipeline YouTube upload hook
        #[arg(long)]
        upload_to_youtube: bool,
    },
    /// Fetch a job and its variants
    GetJob {
        /// Job id
        id: String,
    },
    /// Tail a job's progress stream until it reaches a terminal state
    Watch {
        /// Job id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateJob {
            project_id,
            source_asset_id,
            voice_profile_id,
            languages,
            no_dub,
            no_subs,
            replace_text_in_frame,
            upload_to_youtube,
        } => {
            commands::create_job(
                &cli.api_url,
                &project_id,
                &source_asset_id,
                voice_profile_id.as_deref(),
                &languages,
                commands::OptionFlags {
                    dub: !no_dub,
                    subs: !no_subs,
                    replace_text_in_frame,
                    upload_to_youtube,
                },
            )
            .await?;
        }
        Commands::GetJob { id } => {
            commands::get_job(&cli.api_url, &id).await?;
        }
        Commands::Watch { id } => {
            commands::watch(&cli.api_url, &id).await?;
        }
    }

    Ok(())
}
