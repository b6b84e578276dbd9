//! Command Route
//!
//! - POST /api/cmd - Send `{"action": "on" | "off"}` to the device

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CommandRequest, CommandResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/cmd
///
/// Fire-and-forget: answers as soon as the broker client accepted the
/// publish.
pub async fn send_command(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> ApiResult<Json<CommandResponse>> {
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    let action = req
        .action
        .ok_or_else(|| ApiError::Validation("Missing action. Use on or off".to_string()))?;

    state.commands.publish_command(&action).await?;

    Ok(Json(CommandResponse { ok: true }))
}
