use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::clock::Clock;
use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::models::{Booking, NewBooking, Seat, SeatState};
use crate::repository::{finish_tx, lock_seat_row, SeatRepository, SeatTx};
use crate::services::hold_policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingInput {
    pub show_id: i64,
    pub seat_id: i64,
    pub user_id: i64,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingResponse {
    pub booking_id: i64,
    pub status: BookingStatus,
    pub message: String,
    /// Set when an earlier booking with the same idempotency key was returned.
    pub replayed: bool,
}

impl BookingResponse {
    fn confirmed(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            status: BookingStatus::Confirmed,
            message: "Ticket sent to your email.".to_string(),
            replayed: false,
        }
    }

    fn replayed(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            status: BookingStatus::Confirmed,
            message: "Booking already exists".to_string(),
            replayed: true,
        }
    }
}

/// Converts a live hold into a sale plus a booking record.
#[derive(Clone)]
pub struct SettlementEngine {
    repo: Arc<dyn SeatRepository>,
    clock: Arc<dyn Clock>,
    hold_duration: Duration,
    lock_wait_timeout: std::time::Duration,
}

impl SettlementEngine {
    pub fn new(repo: Arc<dyn SeatRepository>, clock: Arc<dyn Clock>, config: &BookingConfig) -> Self {
        Self {
            repo,
            clock,
            hold_duration: config.hold_duration(),
            lock_wait_timeout: config.lock_wait_timeout(),
        }
    }

    #[instrument(
        skip(self, input),
        fields(show_id = input.show_id, seat_id = input.seat_id, user_id = input.user_id)
    )]
    pub async fn create_booking(&self, input: CreateBookingInput) -> Result<BookingResponse, BookingError> {
        let key = input.idempotency_key.as_deref().filter(|k| !k.is_empty());

        if let Some(key) = key {
            if let Some(existing) = self.repo.find_booking_by_idempotency_key(input.user_id, key).await? {
                info!(booking_id = existing.id, "returning existing booking for idempotency key");
                return Ok(BookingResponse::replayed(&existing));
            }
        }

        let result = match lock_seat_row(self.repo.as_ref(), input.seat_id, self.lock_wait_timeout).await {
            Ok((mut tx, seat)) => {
                let outcome = self.settle(tx.as_mut(), seat, &input, key).await;
                finish_tx(tx, outcome).await
            }
            Err(err) => Err(err),
        };

        match (result, key) {
            (Ok(booking), _) => {
                info!(booking_id = booking.id, "booking confirmed");
                Ok(BookingResponse::confirmed(&booking))
            }
            // a concurrent request with the same key committed first
            (Err(BookingError::DuplicateIdempotencyKey), Some(key)) => {
                match self.repo.find_booking_by_idempotency_key(input.user_id, key).await? {
                    Some(existing) => Ok(BookingResponse::replayed(&existing)),
                    None => Err(BookingError::InvariantViolation(
                        "idempotency key reported taken but no booking found".to_string(),
                    )),
                }
            }
            // the seat may have been sold by that same concurrent request
            (Err(BookingError::SeatNotLocked), Some(key)) => {
                match self.repo.find_booking_by_idempotency_key(input.user_id, key).await? {
                    Some(existing) => Ok(BookingResponse::replayed(&existing)),
                    None => Err(BookingError::SeatNotLocked),
                }
            }
            (Err(err), _) => {
                if matches!(err, BookingError::InvariantViolation(_)) {
                    tracing::error!(error = %err, "settlement hit an invariant violation");
                } else {
                    warn!(error = %err, "booking rejected");
                }
                Err(err)
            }
        }
    }

    async fn settle(
        &self,
        tx: &mut dyn SeatTx,
        seat: Seat,
        input: &CreateBookingInput,
        key: Option<&str>,
    ) -> Result<Booking, BookingError> {
        let now = self.clock.now();

        let (locked_at, holder_id) = match seat.state {
            SeatState::Locked {
                locked_at,
                holder_id,
            } => (locked_at, holder_id),
            SeatState::Available | SeatState::Sold => return Err(BookingError::SeatNotLocked),
        };
        if hold_policy::is_expired(locked_at, now, self.hold_duration) {
            return Err(BookingError::SeatLockExpired);
        }
        if holder_id != input.user_id {
            return Err(BookingError::SeatLockedByOther);
        }
        if seat.show_id != input.show_id {
            return Err(BookingError::SeatShowMismatch);
        }

        tx.update_seat(seat.id, &SeatState::Sold).await?;
        tx.create_booking(NewBooking {
            user_id: input.user_id,
            show_id: input.show_id,
            seat_id: seat.id,
            idempotency_key: key.map(str::to_owned),
        })
        .await
    }
}
