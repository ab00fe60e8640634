//! CLI command implementations. Each one is a thin `reqwest` call against
//! `loc-api`'s REST/SSE surface — the CLI has no business logic of its
//! own, it just renders what the API returns.

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use loc_core::ResourceId;
use loc_core::domain::JobOptions;
use serde::Serialize;
use serde_json::Value;

/// The four option flags a job-creation request carries, named after the
/// CLI's own flags rather than the wire-level `JobOptions` fields the
/// request eventually turns into.
pub struct OptionFlags {
    pub dub: bool,
    pub subs: bool,
    pub replace_text_in_frame: bool,
    pub upload_to_youtube: bool,
}

#[derive(Serialize)]
struct CreateJobRequest<'a> {
    project_id: ResourceId,
    source_asset_id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_profile_id: Option<ResourceId>,
    languages: &'a [String],
    options: JobOptions,
}

fn parse_id(label: &str, raw: &str) -> Result<ResourceId> {
    ResourceId::from_str(raw).with_context(|| format!("invalid {label} id: {raw}"))
}

pub async fn create_job(
    api_url: &str,
    project_id: &str,
    source_asset_id: &str,
    voice_profile_id: Option<&str>,
    languages: &[String],
    flags: OptionFlags,
) -> Result<()> {
    if languages.is_empty() {
        bail!("--languages must name at least one target language");
    }

    let body = CreateJobRequest {
        project_id: parse_id("project", project_id)?,
        source_asset_id: parse_id("source asset", source_asset_id)?,
        voice_profile_id: voice_profile_id
            .map(|id| parse_id("voice profile", id))
            .transpose()?,
        languages,
        options: JobOptions {
            dub: flags.dub,
            subs: flags.subs,
            replace_text_in_frame: flags.replace_text_in_frame,
            upload_to_youtube: flags.upload_to_youtube,
        },
    };

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{api_url}/jobs"))
        .json(&body)
        .send()
        .await
        .context("request to loc-api failed")?;

    print_response(response).await
}

pub async fn get_job(api_url: &str, id: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{api_url}/jobs/{id}"))
        .send()
        .await
        .context("request to loc-api failed")?;

    print_response(response).await
}

async fn print_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let body: Value = response.json().await.context("response was not valid JSON")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("loc-api responded {status}");
    }
    Ok(())
}

/// Tail `GET /jobs/:id/stream`, printing one line per progress event until
/// the job reaches a terminal job-level status (`done`/`partial`/`error`)
/// or the connection closes. Lines are parsed by hand rather than with an
/// SSE client crate: the wire format here is exactly two fields
/// (`event:`/`data:`) per message, which a short hand-rolled scanner
/// covers without pulling in a dependency the rest of the workspace
/// doesn't otherwise need.
pub async fn watch(api_url: &str, id: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{api_url}/jobs/{id}/stream"))
        .send()
        .await
        .context("request to loc-api failed")?;

    if !response.status().is_success() {
        bail!("loc-api responded {}", response.status());
    }

    let mut buf = String::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("error reading SSE stream")?;
        buf.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buf.find("\n\n") {
            let frame = buf[..pos].to_string();
            buf.drain(..pos + 2);
            if let Some(event) = parse_event(&frame) {
                let is_terminal = event.event == "update"
                    && matches!(event.job_status.as_deref(), Some("done" | "partial" | "error"));
                render_event(&event);
                if is_terminal {
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

struct SseEvent {
    event: String,
    job_status: Option<String>,
    raw: String,
}

fn parse_event(frame: &str) -> Option<SseEvent> {
    let mut event = String::from("message");
    let mut data = String::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim());
        }
    }
    if data.is_empty() && event == "message" {
        return None;
    }

    let job_status = serde_json::from_str::<Value>(&data)
        .ok()
        .filter(|v| v.get("stage").and_then(Value::as_str) == Some("job"))
        .and_then(|v| v.get("status").and_then(Value::as_str).map(str::to_string));

    Some(SseEvent {
        event,
        job_status,
        raw: data,
    })
}

fn render_event(event: &SseEvent) {
    if event.event == "keep-alive" {
        return;
    }
    match serde_json::from_str::<Value>(&event.raw) {
        Ok(v) => {
            let stage = v.get("stage").and_then(Value::as_str).unwrap_or("?");
            let lang = v.get("lang").and_then(Value::as_str).unwrap_or("-");
            let status = v.get("status").and_then(Value::as_str).unwrap_or("?");
            let progress = v.get("progress").and_then(Value::as_f64).unwrap_or(0.0);
            println!("[{lang}] {stage}: {status} ({progress:.0}%)", progress = progress * 100.0);
        }
        Err(_) => println!("{}", event.raw),
    }
}
