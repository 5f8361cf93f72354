//! Hold acquisition: transition table, expiry reclaim, contention and lock waits.

mod common;

use chrono::Duration;
use std::sync::Arc;

use seat_booking::clock::Clock;
use seat_booking::config::BookingConfig;
use seat_booking::error::{BookingError, ErrorKind};
use seat_booking::models::{Seat, SeatState};
use seat_booking::repository::SeatRepository;

use common::*;

#[tokio::test]
async fn locking_an_available_seat_records_the_holder() {
    let h = harness(row_of_seats(3));

    let result = h.reservations.lock_seat(2, 10).await.unwrap();

    assert_eq!(result.message, "Locked");
    assert_eq!(result.expires_at, start_time() + hold());
    assert_eq!(
        h.repo.seat(2).unwrap().state,
        SeatState::Locked {
            locked_at: start_time(),
            holder_id: 10
        }
    );
    assert_eq!(h.repo.seat(1).unwrap().state, SeatState::Available);
}

#[tokio::test]
async fn live_hold_rejects_everyone_including_the_holder() {
    let h = harness(row_of_seats(1));
    h.reservations.lock_seat(1, 10).await.unwrap();
    h.clock.advance(Duration::seconds(HOLD_SECS));

    let err = h.reservations.lock_seat(1, 11).await.unwrap_err();
    assert!(matches!(err, BookingError::SeatAlreadyLocked));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h.reservations.lock_seat(1, 10).await.unwrap_err();
    assert!(matches!(err, BookingError::SeatAlreadyLocked));

    assert_eq!(
        h.repo.seat(1).unwrap().state,
        SeatState::Locked {
            locked_at: start_time(),
            holder_id: 10
        }
    );
}

#[tokio::test]
async fn expired_hold_is_reclaimed_by_a_new_holder() {
    let h = harness(row_of_seats(1));
    h.reservations.lock_seat(1, 10).await.unwrap();

    h.clock.advance(hold() + Duration::milliseconds(1));
    let reclaimed_at = h.clock.now();
    let result = h.reservations.lock_seat(1, 20).await.unwrap();

    assert_eq!(result.expires_at, reclaimed_at + hold());
    assert_eq!(
        h.repo.seat(1).unwrap().state,
        SeatState::Locked {
            locked_at: reclaimed_at,
            holder_id: 20
        }
    );
}

#[tokio::test]
async fn sold_seat_cannot_be_locked() {
    let h = harness([Seat {
        state: SeatState::Sold,
        ..Seat::available(1, SHOW_ID, "A1")
    }]);

    let err = h.reservations.lock_seat(1, 10).await.unwrap_err();
    assert!(matches!(err, BookingError::SeatAlreadySold));

    // still sold after the clock moves on
    h.clock.advance(Duration::days(1));
    let err = h.reservations.lock_seat(1, 10).await.unwrap_err();
    assert!(matches!(err, BookingError::SeatAlreadySold));
    assert_eq!(h.repo.seat(1).unwrap().state, SeatState::Sold);
}

#[tokio::test]
async fn unknown_seat_is_not_found() {
    let h = harness(row_of_seats(1));
    let err = h.reservations.lock_seat(404, 10).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound("seat")));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lockers_produce_exactly_one_holder() {
    let h = harness(row_of_seats(1));
    let engine = Arc::new(h.reservations.clone());

    let attempts = (1..=24).map(|user_id| {
        let engine = engine.clone();
        tokio::spawn(async move { (user_id, engine.lock_seat(1, user_id).await) })
    });
    let results = futures::future::join_all(attempts).await;

    let mut winners = Vec::new();
    for joined in results {
        let (user_id, result) = joined.unwrap();
        match result {
            Ok(_) => winners.push(user_id),
            Err(err) => assert!(matches!(err, BookingError::SeatAlreadyLocked), "{err:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    match h.repo.seat(1).unwrap().state {
        SeatState::Locked { holder_id, .. } => assert_eq!(holder_id, winners[0]),
        other => panic!("expected a hold, got {other:?}"),
    }
}

#[tokio::test]
async fn waiting_for_a_stuck_row_is_bounded() {
    let h = harness_with(
        row_of_seats(2),
        BookingConfig {
            hold_duration_secs: HOLD_SECS,
            lock_wait_timeout_ms: 50,
        },
    );

    let mut stuck = h.repo.begin().await.unwrap();
    stuck.get_seat_for_update(1).await.unwrap();

    let err = h.reservations.lock_seat(1, 10).await.unwrap_err();
    assert!(matches!(err, BookingError::LockTimeout));
    assert!(err.is_retriable());
    assert_eq!(h.repo.seat(1).unwrap().state, SeatState::Available);

    // other rows are not affected by the stuck transaction
    h.reservations.lock_seat(2, 10).await.unwrap();

    stuck.rollback().await.unwrap();
    h.reservations.lock_seat(1, 10).await.unwrap();
}

#[tokio::test]
async fn slow_commit_acknowledgement_is_not_reported_as_a_timeout() {
    let h = harness_with_slow_commits(
        row_of_seats(1),
        BookingConfig {
            hold_duration_secs: HOLD_SECS,
            lock_wait_timeout_ms: 50,
        },
        std::time::Duration::from_millis(200),
    );

    let result = h.reservations.lock_seat(1, 7).await.unwrap();

    assert_eq!(result.expires_at, start_time() + hold());
    assert_eq!(
        h.repo.seat(1).unwrap().state,
        SeatState::Locked {
            locked_at: start_time(),
            holder_id: 7
        }
    );
}
