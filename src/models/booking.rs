use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub show_id: i64,
    pub seat_id: i64,
    #[serde(skip)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Booking before the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: i64,
    pub show_id: i64,
    pub seat_id: i64,
    pub idempotency_key: Option<String>,
}
