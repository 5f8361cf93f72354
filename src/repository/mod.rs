//! Data-access contract for seats and bookings.
//!
//! [`SeatRepository`] is the non-transactional view: stale-tolerant reads and
//! [`SeatRepository::begin`]. Every mutation goes through the [`SeatTx`] handle
//! that `begin` returns. The handle is consumed by `commit`/`rollback`, so a
//! finished transaction cannot be reused, and dropping an unfinished handle
//! rolls it back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::error::BookingError;
use crate::models::{Booking, NewBooking, Seat, SeatState};

pub use memory::InMemorySeatRepository;
pub use postgres::PgSeatRepository;

#[async_trait]
pub trait SeatRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SeatTx>, BookingError>;

    /// Plain read without row locks; callers must not mutate based on it.
    async fn list_seats_for_show(&self, show_id: i64) -> Result<Vec<Seat>, BookingError>;

    async fn find_booking_by_idempotency_key(
        &self,
        user_id: i64,
        idempotency_key: &str,
    ) -> Result<Option<Booking>, BookingError>;
}

#[async_trait]
pub trait SeatTx: Send {
    /// Reads the seat holding an exclusive row lock until the transaction
    /// ends. Blocks while another transaction holds the row.
    async fn get_seat_for_update(&mut self, seat_id: i64) -> Result<Seat, BookingError>;

    /// Fails with `InvariantViolation` when no row was affected.
    async fn update_seat(&mut self, seat_id: i64, state: &SeatState) -> Result<(), BookingError>;

    async fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, BookingError>;

    async fn commit(self: Box<Self>) -> Result<(), BookingError>;

    async fn rollback(self: Box<Self>) -> Result<(), BookingError>;
}

/// Opens a transaction and takes the row lock on `seat_id`, giving up with
/// `LockTimeout` once `wait` elapses. Only the wait is bounded: whatever the
/// caller does with the returned handle, commit included, runs to completion.
/// An abandoned wait drops the handle, which rolls it back.
pub async fn lock_seat_row(
    repo: &dyn SeatRepository,
    seat_id: i64,
    wait: Duration,
) -> Result<(Box<dyn SeatTx>, Seat), BookingError> {
    let acquire = async {
        let mut tx = repo.begin().await?;
        match tx.get_seat_for_update(seat_id).await {
            Ok(seat) => Ok::<_, BookingError>((tx, seat)),
            Err(err) => finish_tx(tx, Err(err)).await,
        }
    };

    tokio::time::timeout(wait, acquire)
        .await
        .map_err(|_| BookingError::LockTimeout)?
}

/// Commits on success, rolls back on failure. The original error wins over a
/// failed rollback.
pub async fn finish_tx<T>(
    tx: Box<dyn SeatTx>,
    outcome: Result<T, BookingError>,
) -> Result<T, BookingError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, original = %err, "rollback failed");
            }
            Err(err)
        }
    }
}
