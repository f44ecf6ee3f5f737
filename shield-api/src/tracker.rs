use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use shield_board::tracker::{CheckInReceipt, CheckOutReceipt, Coordinates, ReportedLocation};

use crate::error::AppError;
use crate::middleware::auth::{current_personnel, user_auth_middleware, UserClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "granted")]
    pub permission_granted: bool,
    #[serde(default)]
    pub address: Option<String>,
}

fn granted() -> bool {
    true
}

impl CheckInRequest {
    fn validate(&self) -> Result<(), AppError> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::ValidationError("Coordinates out of range".to_string()));
        }
        Ok(())
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/shifts/{id}/check-in", post(check_in))
        .route("/v1/shifts/{id}/check-out", post(check_out))
        .route_layer(from_fn_with_state(state, user_auth_middleware))
}

async fn check_in(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(shift_id): Path<Uuid>,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<CheckInReceipt>, AppError> {
    req.validate()?;
    let personnel = current_personnel(&state, &claims).await?;

    let device = ReportedLocation {
        coordinates: Coordinates { latitude: req.latitude, longitude: req.longitude },
        permission_granted: req.permission_granted,
        address: req.address,
    };

    let receipt = state
        .tracker
        .check_in(&device, &device, shift_id, personnel.id, Utc::now())
        .await?;
    Ok(Json(receipt))
}

async fn check_out(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<CheckOutReceipt>, AppError> {
    let personnel = current_personnel(&state, &claims).await?;
    let receipt = state.tracker.check_out(shift_id, personnel.id, Utc::now()).await?;
    Ok(Json(receipt))
}
