use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::{AuthUser, IdempotencyKey};
use crate::services::CreateBookingInput;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bookings", post(create_booking))
}

// POST /api/v1/bookings
#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    #[validate(range(min = 1, message = "show_id is required"))]
    show_id: i64,
    #[validate(range(min = 1, message = "seat_id is required"))]
    seat_id: i64,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let result = state
        .settlement
        .create_booking(CreateBookingInput {
            show_id: req.show_id,
            seat_id: req.seat_id,
            user_id: user.user_id,
            idempotency_key,
        })
        .await?;

    Ok(super::ok(result.message.clone(), result))
}
