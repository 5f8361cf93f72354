use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}

// POST /api/v1/login
#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email(message = "email is invalid"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let result = state.auth.login(&req.email, &req.password).await?;
    Ok(super::ok("Login successful", result))
}
