use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use shield_board::assistant::{self, AssistantAnswer};
use shield_store::remote::ChatTurn;

use crate::error::AppError;
use crate::middleware::auth::{user_auth_middleware, UserClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(default)]
    pub user_role: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/assistant/chat", post(chat))
        .route_layer(from_fn_with_state(state, user_auth_middleware))
}

async fn chat(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(req): Json<AssistantRequest>,
) -> Result<Json<AssistantAnswer>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::ValidationError("Message cannot be empty".to_string()));
    }
    let role = req.user_role.unwrap_or(claims.role);
    let reply = assistant::answer(state.chat.as_ref(), &role, &req.message, &req.history).await;
    Ok(Json(reply))
}
