use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::BookingError;
use crate::models::{Booking, NewBooking, Seat, SeatRow, SeatState};

use super::{SeatRepository, SeatTx};

const IDEMPOTENCY_INDEX: &str = "bookings_user_idempotency_key";

#[derive(Clone)]
pub struct PgSeatRepository {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PgSeatRepository {
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }
}

#[async_trait]
impl SeatRepository for PgSeatRepository {
    async fn begin(&self) -> Result<Box<dyn SeatTx>, BookingError> {
        let mut tx = self.pool.begin().await.map_err(BookingError::from_storage)?;

        // SET LOCAL does not take bind parameters
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(BookingError::from_storage)?;

        Ok(Box::new(PgSeatTx { tx }))
    }

    async fn list_seats_for_show(&self, show_id: i64) -> Result<Vec<Seat>, BookingError> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT id, show_id, seat_name, status, locked_at, user_id
             FROM show_seats
             WHERE show_id = $1
             ORDER BY seat_name"
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await
        .map_err(BookingError::from_storage)?;

        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn find_booking_by_idempotency_key(
        &self,
        user_id: i64,
        idempotency_key: &str,
    ) -> Result<Option<Booking>, BookingError> {
        sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, show_id, seat_id, idempotency_key, created_at
             FROM bookings
             WHERE user_id = $1 AND idempotency_key = $2"
        )
        .bind(user_id)
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(BookingError::from_storage)
    }
}

/// Dropping an uncommitted sqlx transaction rolls it back.
pub struct PgSeatTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SeatTx for PgSeatTx {
    async fn get_seat_for_update(&mut self, seat_id: i64) -> Result<Seat, BookingError> {
        let row = sqlx::query_as::<_, SeatRow>(
            "SELECT id, show_id, seat_name, status, locked_at, user_id
             FROM show_seats
             WHERE id = $1
             FOR UPDATE"
        )
        .bind(seat_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(BookingError::from_storage)?
        .ok_or(BookingError::NotFound("seat"))?;

        Seat::try_from(row)
    }

    async fn update_seat(&mut self, seat_id: i64, state: &SeatState) -> Result<(), BookingError> {
        let (status, locked_at, user_id) = state.columns();
        let result = sqlx::query(
            "UPDATE show_seats
             SET status = $1, locked_at = $2, user_id = $3, updated_at = NOW()
             WHERE id = $4"
        )
        .bind(status)
        .bind(locked_at)
        .bind(user_id)
        .bind(seat_id)
        .execute(&mut *self.tx)
        .await
        .map_err(BookingError::from_storage)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::InvariantViolation(format!(
                "update of seat {seat_id} affected zero rows"
            )));
        }
        Ok(())
    }

    async fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, BookingError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (user_id, show_id, seat_id, idempotency_key)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, show_id, seat_id, idempotency_key, created_at"
        )
        .bind(booking.user_id)
        .bind(booking.show_id)
        .bind(booking.seat_id)
        .bind(booking.idempotency_key.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.constraint() == Some(IDEMPOTENCY_INDEX) => {
                BookingError::DuplicateIdempotencyKey
            }
            _ => BookingError::from_storage(err),
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        self.tx.commit().await.map_err(BookingError::from_storage)
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        self.tx.rollback().await.map_err(BookingError::from_storage)
    }
}
