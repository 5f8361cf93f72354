//! In-process repository used by the test suite and for local experiments.
//!
//! It mirrors the row-locking behaviour of the Postgres store: each seat has
//! its own async mutex, a transaction keeps the owned guard of every row it
//! read for update, writes are staged and only become visible on commit, and
//! dropping a transaction releases its rows without applying anything.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

use crate::error::BookingError;
use crate::models::{Booking, NewBooking, Seat, SeatState};

use super::{SeatRepository, SeatTx};

#[derive(Default)]
struct Tables {
    seats: HashMap<i64, Seat>,
    bookings: Vec<Booking>,
}

impl Tables {
    fn key_taken(&self, user_id: i64, key: &str) -> bool {
        self.bookings
            .iter()
            .any(|b| b.user_id == user_id && b.idempotency_key.as_deref() == Some(key))
    }
}

#[derive(Default)]
struct Faults {
    fail_booking_insert: AtomicBool,
    fail_commit: AtomicBool,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
    next_booking_id: AtomicI64,
    faults: Faults,
}

impl Shared {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, BookingError> {
        self.tables
            .lock()
            .map_err(|_| BookingError::Internal("seat table mutex poisoned".to_string()))
    }

    fn row_lock(&self, seat_id: i64) -> Result<Arc<tokio::sync::Mutex<()>>, BookingError> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| BookingError::Internal("row lock table poisoned".to_string()))?;
        Ok(locks.entry(seat_id).or_default().clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemorySeatRepository {
    shared: Arc<Shared>,
}

impl InMemorySeatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seats(seats: impl IntoIterator<Item = Seat>) -> Self {
        let repo = Self::new();
        for seat in seats {
            repo.insert_seat(seat);
        }
        repo
    }

    pub fn insert_seat(&self, seat: Seat) {
        if let Ok(mut tables) = self.shared.tables() {
            tables.seats.insert(seat.id, seat);
        }
    }

    /// Committed state of a seat.
    pub fn seat(&self, seat_id: i64) -> Option<Seat> {
        self.shared
            .tables()
            .ok()
            .and_then(|tables| tables.seats.get(&seat_id).cloned())
    }

    /// Committed bookings, in insertion order.
    pub fn bookings(&self) -> Vec<Booking> {
        self.shared
            .tables()
            .map(|tables| tables.bookings.clone())
            .unwrap_or_default()
    }

    pub fn bookings_for_seat(&self, seat_id: i64) -> Vec<Booking> {
        self.bookings()
            .into_iter()
            .filter(|b| b.seat_id == seat_id)
            .collect()
    }

    /// Makes every subsequent booking insert fail with a transient error.
    pub fn fail_booking_inserts(&self, fail: bool) {
        self.shared.faults.fail_booking_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent commit fail with a transient error.
    pub fn fail_commits(&self, fail: bool) {
        self.shared.faults.fail_commit.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SeatRepository for InMemorySeatRepository {
    async fn begin(&self) -> Result<Box<dyn SeatTx>, BookingError> {
        Ok(Box::new(InMemoryTx {
            shared: self.shared.clone(),
            held_rows: HashMap::new(),
            staged_seats: HashMap::new(),
            staged_bookings: Vec::new(),
        }))
    }

    async fn list_seats_for_show(&self, show_id: i64) -> Result<Vec<Seat>, BookingError> {
        let tables = self.shared.tables()?;
        let mut seats: Vec<Seat> = tables
            .seats
            .values()
            .filter(|seat| seat.show_id == show_id)
            .cloned()
            .collect();
        seats.sort_by(|a, b| a.seat_name.cmp(&b.seat_name));
        Ok(seats)
    }

    async fn find_booking_by_idempotency_key(
        &self,
        user_id: i64,
        idempotency_key: &str,
    ) -> Result<Option<Booking>, BookingError> {
        let tables = self.shared.tables()?;
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.user_id == user_id && b.idempotency_key.as_deref() == Some(idempotency_key))
            .cloned())
    }
}

pub struct InMemoryTx {
    shared: Arc<Shared>,
    held_rows: HashMap<i64, OwnedMutexGuard<()>>,
    staged_seats: HashMap<i64, Seat>,
    staged_bookings: Vec<Booking>,
}

#[async_trait]
impl SeatTx for InMemoryTx {
    async fn get_seat_for_update(&mut self, seat_id: i64) -> Result<Seat, BookingError> {
        if !self.held_rows.contains_key(&seat_id) {
            let exists = self.shared.tables()?.seats.contains_key(&seat_id);
            if !exists {
                return Err(BookingError::NotFound("seat"));
            }
            let row = self.shared.row_lock(seat_id)?;
            let guard = row.lock_owned().await;
            self.held_rows.insert(seat_id, guard);
        }

        if let Some(staged) = self.staged_seats.get(&seat_id) {
            return Ok(staged.clone());
        }
        let committed = self.shared.tables()?.seats.get(&seat_id).cloned();
        committed.ok_or(BookingError::NotFound("seat"))
    }

    async fn update_seat(&mut self, seat_id: i64, state: &SeatState) -> Result<(), BookingError> {
        if !self.held_rows.contains_key(&seat_id) {
            return Err(BookingError::InvariantViolation(format!(
                "update of seat {seat_id} without holding its row lock"
            )));
        }

        let current = match self.staged_seats.get(&seat_id) {
            Some(staged) => Some(staged.clone()),
            None => self.shared.tables()?.seats.get(&seat_id).cloned(),
        };
        let mut seat = current.ok_or_else(|| {
            BookingError::InvariantViolation(format!("update of seat {seat_id} affected zero rows"))
        })?;

        seat.state = state.clone();
        self.staged_seats.insert(seat_id, seat);
        Ok(())
    }

    async fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, BookingError> {
        if self.shared.faults.fail_booking_insert.load(Ordering::SeqCst) {
            return Err(BookingError::Transient("booking insert failed".to_string()));
        }

        if let Some(key) = booking.idempotency_key.as_deref() {
            let staged_dup = self
                .staged_bookings
                .iter()
                .any(|b| b.user_id == booking.user_id && b.idempotency_key.as_deref() == Some(key));
            if staged_dup || self.shared.tables()?.key_taken(booking.user_id, key) {
                return Err(BookingError::DuplicateIdempotencyKey);
            }
        }

        let id = self.shared.next_booking_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Booking {
            id,
            user_id: booking.user_id,
            show_id: booking.show_id,
            seat_id: booking.seat_id,
            idempotency_key: booking.idempotency_key,
            created_at: Utc::now(),
        };
        self.staged_bookings.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        let InMemoryTx {
            shared,
            held_rows,
            staged_seats,
            staged_bookings,
        } = *self;

        if shared.faults.fail_commit.load(Ordering::SeqCst) {
            return Err(BookingError::Transient("commit failed".to_string()));
        }

        {
            let mut tables = shared.tables()?;
            // unique (user_id, idempotency_key), checked atomically with the apply
            for booking in &staged_bookings {
                if let Some(key) = booking.idempotency_key.as_deref() {
                    if tables.key_taken(booking.user_id, key) {
                        return Err(BookingError::DuplicateIdempotencyKey);
                    }
                }
            }
            for (id, seat) in staged_seats {
                tables.seats.insert(id, seat);
            }
            tables.bookings.extend(staged_bookings);
        }

        drop(held_rows);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        Ok(())
    }
}
