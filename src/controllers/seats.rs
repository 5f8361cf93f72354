use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows/{id}/seats", get(list_seats))
        .route("/seats/{id}/lock", patch(lock_seat))
}

// GET /api/v1/shows/{id}/seats
async fn list_seats(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let show_id = super::positive_id(show_id, "show ID")?;

    let seats = state.seats.list_seats_for_show(show_id).await?;
    Ok(super::ok("Seats retrieved successfully", seats))
}

// PATCH /api/v1/seats/{id}/lock
async fn lock_seat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(seat_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let seat_id = super::positive_id(seat_id, "seat ID")?;

    let result = state.reservations.lock_seat(seat_id, user.user_id).await?;
    Ok(super::ok(result.message.clone(), result))
}
