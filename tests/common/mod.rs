#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use seat_booking::clock::ManualClock;
use seat_booking::config::BookingConfig;
use seat_booking::error::BookingError;
use seat_booking::models::{Booking, NewBooking, Seat, SeatState};
use seat_booking::repository::{InMemorySeatRepository, SeatRepository, SeatTx};
use seat_booking::services::{CreateBookingInput, ReservationEngine, SeatService, SettlementEngine};

pub const SHOW_ID: i64 = 1;
pub const OTHER_SHOW_ID: i64 = 2;
pub const HOLD_SECS: i64 = 600;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 18, 0, 0).unwrap()
}

pub fn hold() -> Duration {
    Duration::seconds(HOLD_SECS)
}

pub struct Harness {
    pub repo: InMemorySeatRepository,
    pub clock: Arc<ManualClock>,
    pub reservations: ReservationEngine,
    pub settlement: SettlementEngine,
    pub seats: SeatService,
}

pub fn harness(seats: impl IntoIterator<Item = Seat>) -> Harness {
    harness_with(
        seats,
        BookingConfig {
            hold_duration_secs: HOLD_SECS,
            lock_wait_timeout_ms: 2_000,
        },
    )
}

pub fn harness_with(seats: impl IntoIterator<Item = Seat>, config: BookingConfig) -> Harness {
    let repo = InMemorySeatRepository::with_seats(seats);
    let shared: Arc<dyn SeatRepository> = Arc::new(repo.clone());
    build(repo, shared, config)
}

/// Like [`harness_with`], but every commit is acknowledged `ack_delay` after
/// it has been applied.
pub fn harness_with_slow_commits(
    seats: impl IntoIterator<Item = Seat>,
    config: BookingConfig,
    ack_delay: std::time::Duration,
) -> Harness {
    let repo = InMemorySeatRepository::with_seats(seats);
    let shared: Arc<dyn SeatRepository> = Arc::new(SlowCommitRepository {
        inner: repo.clone(),
        ack_delay,
    });
    build(repo, shared, config)
}

fn build(repo: InMemorySeatRepository, shared: Arc<dyn SeatRepository>, config: BookingConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(start_time()));

    Harness {
        reservations: ReservationEngine::new(shared.clone(), clock.clone(), &config),
        settlement: SettlementEngine::new(shared.clone(), clock.clone(), &config),
        seats: SeatService::new(shared, clock.clone(), &config),
        repo,
        clock,
    }
}

/// Seats 1..=n named A1..An, all in `SHOW_ID`.
pub fn row_of_seats(n: i64) -> Vec<Seat> {
    (1..=n)
        .map(|id| Seat::available(id, SHOW_ID, format!("A{id}")))
        .collect()
}

pub fn booking(seat_id: i64, user_id: i64, key: Option<&str>) -> CreateBookingInput {
    CreateBookingInput {
        show_id: SHOW_ID,
        seat_id,
        user_id,
        idempotency_key: key.map(str::to_string),
    }
}

struct SlowCommitRepository {
    inner: InMemorySeatRepository,
    ack_delay: std::time::Duration,
}

#[async_trait]
impl SeatRepository for SlowCommitRepository {
    async fn begin(&self) -> Result<Box<dyn SeatTx>, BookingError> {
        Ok(Box::new(SlowCommitTx {
            inner: self.inner.begin().await?,
            ack_delay: self.ack_delay,
        }))
    }

    async fn list_seats_for_show(&self, show_id: i64) -> Result<Vec<Seat>, BookingError> {
        self.inner.list_seats_for_show(show_id).await
    }

    async fn find_booking_by_idempotency_key(
        &self,
        user_id: i64,
        idempotency_key: &str,
    ) -> Result<Option<Booking>, BookingError> {
        self.inner
            .find_booking_by_idempotency_key(user_id, idempotency_key)
            .await
    }
}

struct SlowCommitTx {
    inner: Box<dyn SeatTx>,
    ack_delay: std::time::Duration,
}

#[async_trait]
impl SeatTx for SlowCommitTx {
    async fn get_seat_for_update(&mut self, seat_id: i64) -> Result<Seat, BookingError> {
        self.inner.get_seat_for_update(seat_id).await
    }

    async fn update_seat(&mut self, seat_id: i64, state: &SeatState) -> Result<(), BookingError> {
        self.inner.update_seat(seat_id, state).await
    }

    async fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, BookingError> {
        self.inner.create_booking(booking).await
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        let SlowCommitTx { inner, ack_delay } = *self;
        inner.commit().await?;
        tokio::time::sleep(ack_delay).await;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        self.inner.rollback().await
    }
}
