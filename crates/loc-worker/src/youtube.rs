//! The post-pipeline YouTube upload hook.
//!
//! Consumes `youtube.upload`, never touches the database or a variant's
//! status, and logs a simulated upload URL — mirroring the original
//! service's `yt-uploader` stub, which never implemented a real YouTube
//! Data API call either. A failure here is logged and acked; there is no
//! downstream state for it to leave inconsistent.

use futures::StreamExt;
use loc_bus::MessageBus;
use loc_core::envelope::BusMessage;
use loc_progress::ProgressChannel;
use tracing::{info, warn};

const QUEUE: &str = "youtube-agent";

pub async fn run(bus: MessageBus, progress: ProgressChannel) -> loc_bus::BusResult<()> {
    bus.declare_queue(QUEUE, loc_bus::youtube_upload_key()).await?;
    let mut consumer = bus.consume(QUEUE, QUEUE).await?;

    info!("youtube uploader consuming");

    while let Some(delivery) = consumer.next().await {
        let Ok(delivery) = delivery else {
            warn!("delivery error on youtube-agent, skipping");
            continue;
        };

        match loc_bus::decode(&delivery.data) {
            Ok(BusMessage::YoutubeUpload(upload)) => {
                let simulated_url = format!(
                    "https://youtube.example/watch?v={}-{}",
                    upload.job_id, upload.lang
                );
                info!(
                    job_id = %upload.job_id,
                    variant_id = %upload.variant_id,
                    lang = %upload.lang,
                    video_url = %upload.video_url,
                    uploaded_to = %simulated_url,
                    "simulated youtube upload"
                );
                progress
                    .publish_job_event_best_effort(&loc_progress::ProgressEvent {
                        job_id: upload.job_id,
                        stage: "youtube".to_string(),
                        lang: Some(upload.lang.clone()),
                        status: "done".to_string(),
                        progress: 1.0,
                        message: Some(simulated_url),
                        timestamp: chrono::Utc::now(),
                    })
                    .await;
            }
            Ok(_) => warn!("unexpected message on youtube-agent, dropping"),
            Err(err) => warn!(error = %err, "malformed delivery on youtube-agent, dropping"),
        }

        let _ = loc_bus::ack(&delivery).await;
    }

    Ok(())
}
