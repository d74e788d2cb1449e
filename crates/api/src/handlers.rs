use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use common::types::ToggleView;
use serde::Serialize;
use serde_json::{json, Value};
use store::blob_key;
use toggle::{ValidationError, WriteOutcome};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AcceptedBody {
    pub success: bool,
    #[serde(flatten)]
    pub record: ToggleView,
}

/// Run store work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("store task failed: {}", e)))?
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "policy": state.controller.policy_kind().name(),
    }))
}

// === Toggle ===

pub async fn get_toggle(State(state): State<AppState>) -> Result<Json<ToggleView>, ApiError> {
    let controller = state.controller.clone();
    let view = blocking(move || Ok(controller.read()?)).await?;
    Ok(Json(view))
}

pub async fn post_toggle(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AcceptedBody>, ApiError> {
    let controller = state.controller.clone();
    let outcome = blocking(move || Ok(controller.write(&body)?)).await?;

    match outcome {
        WriteOutcome::Accepted(record) => Ok(Json(AcceptedBody {
            success: true,
            record,
        })),
        WriteOutcome::Conflict(report) => Err(report.into()),
    }
}

// === Generic blobs ===

pub async fn get_storage(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    let raw = blocking(move || Ok(store.get(&blob_key(&key))?)).await?;

    let value = match raw {
        Some(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        None => Value::Null,
    };
    Ok(Json(value))
}

pub async fn post_storage(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    let text = value.to_string();

    let store = state.store.clone();
    blocking(move || {
        debug!("Storing blob {} ({} bytes)", key, text.len());
        Ok(store.set(&blob_key(&key), &text)?)
    })
    .await?;

    Ok(Json(json!({ "success": true })))
}
