//! Realtime voice credential minting.

use crate::api::ApiError;
use crate::middleware::UserContext;
use crate::AppState;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeKeyResponse {
    /// Short-lived client secret for the browser's realtime connection.
    pub api_key: String,
}

/// POST /realtime-key
///
/// Mints one ephemeral credential per call. The server's own API key never
/// leaves the process.
pub async fn realtime_key_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext(user)): Extension<UserContext>,
) -> Result<Json<RealtimeKeyResponse>, ApiError> {
    let secret = state
        .realtime
        .mint_client_secret()
        .await
        .map_err(|e| ApiError::RealtimeSession(e.to_string()))?;

    tracing::info!(user_id = %user.user_id, "issued realtime client secret");

    Ok(Json(RealtimeKeyResponse {
        api_key: secret.value,
    }))
}
