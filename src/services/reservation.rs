use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::clock::Clock;
use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::models::{Seat, SeatState};
use crate::repository::{finish_tx, lock_seat_row, SeatRepository, SeatTx};
use crate::services::hold_policy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockSeatResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Acquires temporary holds on seats.
#[derive(Clone)]
pub struct ReservationEngine {
    repo: Arc<dyn SeatRepository>,
    clock: Arc<dyn Clock>,
    hold_duration: Duration,
    lock_wait_timeout: std::time::Duration,
}

impl ReservationEngine {
    pub fn new(repo: Arc<dyn SeatRepository>, clock: Arc<dyn Clock>, config: &BookingConfig) -> Self {
        Self {
            repo,
            clock,
            hold_duration: config.hold_duration(),
            lock_wait_timeout: config.lock_wait_timeout(),
        }
    }

    /// AVAILABLE, or LOCKED with an expired hold, becomes LOCKED by `user_id`.
    /// A live hold or a sold seat is rejected.
    #[instrument(skip(self))]
    pub async fn lock_seat(&self, seat_id: i64, user_id: i64) -> Result<LockSeatResponse, BookingError> {
        let (mut tx, seat) =
            lock_seat_row(self.repo.as_ref(), seat_id, self.lock_wait_timeout).await?;
        let outcome = self.acquire(tx.as_mut(), seat, user_id).await;
        let locked_at = finish_tx(tx, outcome).await?;

        let expires_at = hold_policy::expires_at(locked_at, self.hold_duration);
        info!(%expires_at, "seat locked");
        Ok(LockSeatResponse {
            message: "Locked".to_string(),
            expires_at,
        })
    }

    async fn acquire(
        &self,
        tx: &mut dyn SeatTx,
        seat: Seat,
        user_id: i64,
    ) -> Result<DateTime<Utc>, BookingError> {
        // read after the row lock is granted; time spent waiting does not count
        let now = self.clock.now();

        match seat.state {
            SeatState::Available => {}
            SeatState::Locked { locked_at, .. }
                if hold_policy::is_expired(locked_at, now, self.hold_duration) => {}
            SeatState::Locked { .. } => return Err(BookingError::SeatAlreadyLocked),
            SeatState::Sold => return Err(BookingError::SeatAlreadySold),
        }

        tx.update_seat(
            seat.id,
            &SeatState::Locked {
                locked_at: now,
                holder_id: user_id,
            },
        )
        .await?;
        Ok(now)
    }
}
