use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatStatus {
    Available,
    Locked,
    Sold,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Locked => "LOCKED",
            SeatStatus::Sold => "SOLD",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "LOCKED" => Ok(SeatStatus::Locked),
            "SOLD" => Ok(SeatStatus::Sold),
            other => Err(BookingError::InvariantViolation(format!(
                "unknown seat status {other:?}"
            ))),
        }
    }
}

/// Concurrency-sensitive part of a seat. Lock metadata only exists while held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatState {
    Available,
    Locked {
        locked_at: DateTime<Utc>,
        holder_id: i64,
    },
    Sold,
}

impl SeatState {
    pub fn status(&self) -> SeatStatus {
        match self {
            SeatState::Available => SeatStatus::Available,
            SeatState::Locked { .. } => SeatStatus::Locked,
            SeatState::Sold => SeatStatus::Sold,
        }
    }

    /// Column values as stored: (status, locked_at, user_id).
    pub fn columns(&self) -> (&'static str, Option<DateTime<Utc>>, Option<i64>) {
        match self {
            SeatState::Locked {
                locked_at,
                holder_id,
            } => (SeatStatus::Locked.as_str(), Some(*locked_at), Some(*holder_id)),
            other => (other.status().as_str(), None, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: i64,
    pub show_id: i64,
    pub seat_name: String,
    pub state: SeatState,
}

impl Seat {
    pub fn available(id: i64, show_id: i64, seat_name: impl Into<String>) -> Self {
        Seat {
            id,
            show_id,
            seat_name: seat_name.into(),
            state: SeatState::Available,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SeatRow {
    pub id: i64,
    pub show_id: i64,
    pub seat_name: String,
    pub status: String,
    pub locked_at: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
}

impl TryFrom<SeatRow> for Seat {
    type Error = BookingError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let status: SeatStatus = row.status.parse()?;
        let state = match (status, row.locked_at, row.user_id) {
            (SeatStatus::Locked, Some(locked_at), Some(holder_id)) => SeatState::Locked {
                locked_at,
                holder_id,
            },
            (SeatStatus::Available, None, None) => SeatState::Available,
            (SeatStatus::Sold, None, None) => SeatState::Sold,
            _ => {
                return Err(BookingError::InvariantViolation(format!(
                    "seat {} has status {} with inconsistent lock columns",
                    row.id, status
                )))
            }
        };

        Ok(Seat {
            id: row.id,
            show_id: row.show_id,
            seat_name: row.seat_name,
            state,
        })
    }
}

/// Read-path projection of a seat. Expired holds are reported as available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub id: i64,
    pub show_id: i64,
    pub seat_name: String,
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, locked_at: Option<DateTime<Utc>>, user_id: Option<i64>) -> SeatRow {
        SeatRow {
            id: 1,
            show_id: 1,
            seat_name: "A1".to_string(),
            status: status.to_string(),
            locked_at,
            user_id,
        }
    }

    #[test]
    fn locked_row_carries_holder() {
        let now = Utc::now();
        let seat = Seat::try_from(row("LOCKED", Some(now), Some(9))).unwrap();
        assert_eq!(
            seat.state,
            SeatState::Locked {
                locked_at: now,
                holder_id: 9
            }
        );
        assert_eq!(seat.state.columns(), ("LOCKED", Some(now), Some(9)));
    }

    #[test]
    fn half_populated_lock_columns_are_rejected() {
        let err = Seat::try_from(row("LOCKED", Some(Utc::now()), None)).unwrap_err();
        assert!(matches!(err, BookingError::InvariantViolation(_)));

        let err = Seat::try_from(row("SOLD", None, Some(3))).unwrap_err();
        assert!(matches!(err, BookingError::InvariantViolation(_)));
    }

    #[test]
    fn sold_clears_lock_columns() {
        assert_eq!(SeatState::Sold.columns(), ("SOLD", None, None));
        assert_eq!("SOLD".parse::<SeatStatus>().unwrap(), SeatStatus::Sold);
        assert!("RESERVED".parse::<SeatStatus>().is_err());
    }
}
