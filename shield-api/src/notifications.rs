use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use shield_core::models::Notification;

use crate::error::AppError;
use crate::middleware::auth::{user_auth_middleware, UserClaims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/notifications", get(list_notifications))
        .route_layer(from_fn_with_state(state, user_auth_middleware))
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let user_id = claims.user_id()?;
    let notifications = state.store.list_notifications(user_id).await?;
    Ok(Json(notifications))
}
