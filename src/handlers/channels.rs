use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

// Always 200: failures come back as {"error": ...}
pub async fn list_channels_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.messenger.list_channels().await {
        Ok(channels) => Json(json!(channels)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list channels");
            Json(json!({ "error": e.to_string() }))
        }
    }
}
