use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use thiserror::Error;

/// Failures produced by the reservation and settlement engines and by the
/// repositories underneath them.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("seat is already locked")]
    SeatAlreadyLocked,
    #[error("seat is already sold")]
    SeatAlreadySold,
    #[error("seat is not locked")]
    SeatNotLocked,
    #[error("seat lock has expired")]
    SeatLockExpired,
    #[error("seat is locked by another user")]
    SeatLockedByOther,
    #[error("seat does not belong to this show")]
    SeatShowMismatch,

    /// The caller's deadline elapsed while waiting for the seat row lock.
    #[error("timed out waiting for seat lock")]
    LockTimeout,
    #[error("storage temporarily unavailable: {0}")]
    Transient(String),

    /// Raised by the storage layer when (user, idempotency key) is already taken.
    #[error("idempotency key already used by this user")]
    DuplicateIdempotencyKey,

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("internal storage error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Transient,
    InvariantViolation,
    Internal,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::SeatAlreadyLocked
            | BookingError::SeatAlreadySold
            | BookingError::SeatNotLocked
            | BookingError::SeatLockExpired
            | BookingError::SeatLockedByOther
            | BookingError::SeatShowMismatch
            | BookingError::DuplicateIdempotencyKey => ErrorKind::Conflict,
            BookingError::LockTimeout | BookingError::Transient(_) => ErrorKind::Transient,
            BookingError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            BookingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Safe to retry the whole operation from scratch.
    pub fn is_retriable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Maps a sqlx failure onto the booking error taxonomy.
    pub fn from_storage(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => BookingError::NotFound("record"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                BookingError::Transient(err.to_string())
            }
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    return BookingError::InvariantViolation(err.to_string());
                }
                match db.code().as_deref() {
                    // lock_not_available, serialization_failure, deadlock_detected, query_canceled
                    Some("55P03") | Some("40001") | Some("40P01") | Some("57014") => {
                        BookingError::Transient(err.to_string())
                    }
                    _ => BookingError::Internal(err.to_string()),
                }
            }
            _ => BookingError::Internal(err.to_string()),
        }
    }
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}

impl ApiError {
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, (*msg).to_string()),
            ApiError::Booking(err) => match err.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ErrorKind::Conflict => (StatusCode::CONFLICT, err.to_string()),
                ErrorKind::Transient => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable, please retry".to_string(),
                ),
                ErrorKind::InvariantViolation | ErrorKind::Internal => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            ApiError::Database(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "statusCode": status.as_u16(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

/// Response for a handler that panicked. The panic payload is logged, never returned.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
