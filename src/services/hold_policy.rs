//! Expiry rule for seat holds.
//!
//! The same rule serves two readers with different consequences: the seat
//! listing uses it to *display* a stale hold as available without touching
//! storage, while the write paths re-evaluate it under the row lock to
//! *decide* whether the hold can be reclaimed or settled.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Seat, SeatState, SeatStatus, SeatView};

/// True iff `now - locked_at > hold_duration`. A hold is still valid at exactly
/// `locked_at + hold_duration`.
pub fn is_expired(locked_at: DateTime<Utc>, now: DateTime<Utc>, hold_duration: Duration) -> bool {
    now - locked_at > hold_duration
}

pub fn expires_at(locked_at: DateTime<Utc>, hold_duration: Duration) -> DateTime<Utc> {
    locked_at + hold_duration
}

/// Projects a stored seat for display, reporting an expired hold as available.
pub fn display_view(seat: Seat, now: DateTime<Utc>, hold_duration: Duration) -> SeatView {
    let (status, locked_at, user_id) = match seat.state {
        SeatState::Locked {
            locked_at,
            holder_id,
        } if !is_expired(locked_at, now, hold_duration) => {
            (SeatStatus::Locked, Some(locked_at), Some(holder_id))
        }
        SeatState::Locked { .. } | SeatState::Available => (SeatStatus::Available, None, None),
        SeatState::Sold => (SeatStatus::Sold, None, None),
    };

    SeatView {
        id: seat.id,
        show_id: seat.show_id,
        seat_name: seat.seat_name,
        status,
        locked_at,
        user_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn boundary_is_not_expired() {
        let locked_at = Utc::now();
        let hold = Duration::minutes(10);
        assert!(!is_expired(locked_at, locked_at + hold, hold));
        assert!(is_expired(locked_at, locked_at + hold + Duration::milliseconds(1), hold));
    }

    #[test]
    fn expired_hold_is_displayed_as_available() {
        let locked_at = Utc::now();
        let hold = Duration::minutes(10);
        let seat = Seat {
            id: 4,
            show_id: 1,
            seat_name: "A4".to_string(),
            state: SeatState::Locked {
                locked_at,
                holder_id: 12,
            },
        };

        let fresh = display_view(seat.clone(), locked_at + Duration::minutes(1), hold);
        assert_eq!(fresh.status, SeatStatus::Locked);
        assert_eq!(fresh.user_id, Some(12));

        let stale = display_view(seat, locked_at + Duration::minutes(11), hold);
        assert_eq!(stale.status, SeatStatus::Available);
        assert_eq!(stale.locked_at, None);
        assert_eq!(stale.user_id, None);
    }

    proptest! {
        #[test]
        fn expiry_matches_elapsed_time(
            elapsed_ms in -1_000_000i64..10_000_000,
            hold_ms in 0i64..5_000_000,
        ) {
            let locked_at = Utc::now();
            let now = locked_at + Duration::milliseconds(elapsed_ms);
            let hold = Duration::milliseconds(hold_ms);
            prop_assert_eq!(is_expired(locked_at, now, hold), elapsed_ms > hold_ms);
        }

        #[test]
        fn expiry_is_monotonic_in_now(
            first_ms in 0i64..1_000_000,
            extra_ms in 0i64..1_000_000,
            hold_ms in 0i64..1_000_000,
        ) {
            let locked_at = Utc::now();
            let hold = Duration::milliseconds(hold_ms);
            let earlier = locked_at + Duration::milliseconds(first_ms);
            let later = earlier + Duration::milliseconds(extra_ms);
            if is_expired(locked_at, earlier, hold) {
                prop_assert!(is_expired(locked_at, later, hold));
            }
        }
    }
}
