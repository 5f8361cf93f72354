pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod seats;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::error::{self, ApiError};

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new().nest(
        "/v1",
        Router::new()
            .merge(auth::routes())
            .merge(catalog::routes())
            .merge(seats::routes())
            .merge(bookings::routes()),
    )
}

/// Cross-cutting layers for the whole app. A handler that overruns
/// `handler_timeout` gets 503; a panicking handler gets the opaque 500 envelope.
pub fn with_http_layers(router: Router, handler_timeout: Duration) -> Router {
    router
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            handler_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/* ---------- helpers ---------- */

/// Envelope shared by every successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    pub values: T,
}

pub fn ok<T: Serialize>(message: impl Into<String>, values: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            values,
        }),
    )
}

fn positive_id(id: i64, name: &str) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::BadRequest(format!("invalid {name}")));
    }
    Ok(id)
}
