use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;
use uuid::Uuid;
use shield_board::{ClaimOutcome, ClaimQuote};
use shield_core::models::{AvailableShift, Shift};

use crate::error::AppError;
use crate::middleware::auth::{current_personnel, user_auth_middleware, UserClaims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClaimResponseBody {
    pub shift_id: Uuid,
    pub status: &'static str,
    pub message: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/shifts/available", get(list_available))
        .route("/v1/shifts/refresh", post(refresh_available))
        .route("/v1/shifts/mine", get(my_shifts))
        .route("/v1/shifts/stream", get(stream_claims))
        .route("/v1/shifts/{id}/quote", get(quote_shift))
        .route("/v1/shifts/{id}/claim", post(claim_shift))
        .route_layer(from_fn_with_state(state, user_auth_middleware))
}

async fn list_available(State(state): State<AppState>) -> Json<Vec<AvailableShift>> {
    Json(state.poller.snapshot())
}

async fn refresh_available(State(state): State<AppState>) -> Result<Json<Vec<AvailableShift>>, AppError> {
    let shifts = state.poller.refresh().await?;
    Ok(Json(shifts))
}

async fn my_shifts(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<Vec<Shift>>, AppError> {
    let personnel = current_personnel(&state, &claims).await?;
    let shifts = state.store.list_personnel_shifts(personnel.id).await?;
    Ok(Json(shifts))
}

async fn quote_shift(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<ClaimQuote>, AppError> {
    let quote = state.claims.quote_for(shift_id).await?;
    Ok(Json(quote))
}

async fn claim_shift(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(shift_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ClaimResponseBody>), AppError> {
    let personnel = current_personnel(&state, &claims).await?;

    match state.claims.claim(shift_id, &personnel).await? {
        // Side effects keep running after the response goes out.
        ClaimOutcome::Claimed { shift_id, side_effects: _ } => {
            info!("Shift {} claimed via API by {}", shift_id, personnel.id);
            Ok((StatusCode::OK, Json(ClaimResponseBody {
                shift_id,
                status: "CLAIMED",
                message: "Shift claimed successfully".to_string(),
            })))
        }
        ClaimOutcome::TooSlow { message } => Err(AppError::ConflictError(message)),
        ClaimOutcome::Rejected { message, .. } => Err(AppError::UnprocessableError(message)),
    }
}

async fn stream_claims(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event("shift_claimed")
                .json_data(&event)
                .ok()
                .map(Ok),
            // Lagged receivers skip missed events.
            Err(_) => None,
        }
    });

    info!("Claim stream subscriber connected");
    Sse::new(stream).keep_alive(KeepAlive::default())
}
