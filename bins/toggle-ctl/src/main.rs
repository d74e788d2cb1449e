//! toggle-ctl — command-line client for toggle-server.
//!
//! Writes follow the caller-side retry discipline: read the record, submit a
//! write carrying the matching precondition, and on 409 rebuild the write
//! from the returned `latest` record and try again with backoff.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use common::types::{ToggleView, SYSTEM_CLIENT_ID};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{info, warn, Level};

const MAX_RETRIES: u32 = 5;
const BASE_BACKOFF_MS: u64 = 50;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_URL: &str = "http://127.0.0.1:8080";

fn usage() -> ! {
    eprintln!(
        "usage: toggle-ctl [--url URL] [--client ID] <command>\n\
         commands:\n  \
           get\n  \
           set <true|false>\n  \
           storage-get <key>\n  \
           storage-set <key> <json>"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let mut url = DEFAULT_URL.to_string();
    let mut client_id = SYSTEM_CLIENT_ID.to_string();
    let mut rest = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => url = args.next().unwrap_or_else(|| usage()),
            "--client" => client_id = args.next().unwrap_or_else(|| usage()),
            _ => rest.push(arg),
        }
    }

    let http = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("failed to build HTTP client")?;
    let base = url.trim_end_matches('/');

    match rest.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["get"] => {
            let view = fetch_toggle(&http, base).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ["set", value] => {
            let value: bool = value
                .parse()
                .with_context(|| format!("expected true or false, got {}", value))?;
            let latest = fetch_toggle(&http, base).await?;
            let view = set_with_retry(&http, base, latest, value, &client_id).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ["storage-get", key] => {
            let value: Value = http
                .get(format!("{}/storage/{}", base, key))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ["storage-set", key, raw] => {
            let value: Value =
                serde_json::from_str(raw).with_context(|| format!("invalid JSON: {}", raw))?;
            http.post(format!("{}/storage/{}", base, key))
                .json(&value)
                .send()
                .await?
                .error_for_status()?;
            info!("Stored {}", key);
        }
        _ => usage(),
    }

    Ok(())
}

async fn fetch_toggle(http: &Client, base: &str) -> Result<ToggleView> {
    let view = http
        .get(format!("{}/toggle", base))
        .send()
        .await?
        .error_for_status()?
        .json::<ToggleView>()
        .await?;
    Ok(view)
}

/// Body for a write of `value`, shaped by what the server exposes.
fn write_body(latest: &ToggleView, value: bool, client_id: &str, now_ms: i64) -> Value {
    match (latest.version, latest.updated_at) {
        (Some(version), _) => json!({
            "toggle": value,
            "expectedVersion": version,
            "clientId": client_id,
        }),
        (None, Some(updated_at)) => json!({
            "toggle": value,
            // Never propose a timestamp the server already considers current.
            "timestamp": now_ms.max(updated_at.saturating_add(1)),
            "clientId": client_id,
        }),
        (None, None) => json!(value),
    }
}

/// Write `value` starting from `latest`, retrying up to `MAX_RETRIES` times
/// on conflict.
async fn set_with_retry(
    http: &Client,
    base: &str,
    mut latest: ToggleView,
    value: bool,
    client_id: &str,
) -> Result<ToggleView> {
    let mut attempt = 0;

    loop {
        let body = write_body(&latest, value, client_id, chrono::Utc::now().timestamp_millis());
        let response = http
            .post(format!("{}/toggle", base))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let view = response.json::<ToggleView>().await?;
                info!("Toggle set to {} (attempt {})", view.value, attempt + 1);
                return Ok(view);
            }
            StatusCode::CONFLICT if attempt < MAX_RETRIES => {
                let report: Value = response.json().await?;
                latest = serde_json::from_value(report["latest"].clone())
                    .context("conflict response without latest record")?;
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    "Write conflict ({}), retry {}/{} after {:?}",
                    report["reason"], attempt + 1, MAX_RETRIES, backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                bail!("toggle write failed with {}: {}", status, text);
            }
        }
    }
}
