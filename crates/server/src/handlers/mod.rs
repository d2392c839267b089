//! HTTP request handlers.

mod transfers;

pub use transfers::{download_file, upload_file};

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

/// GET /v1/health - Health check endpoint.
///
/// Probes both backing stores. Intentionally unauthenticated for load
/// balancer probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.blobs.health_check().await?;
    state.metadata.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}
