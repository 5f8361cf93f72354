use chrono::Duration;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::models::SeatView;
use crate::repository::SeatRepository;
use crate::services::hold_policy;

/// Read path for seat maps. Never takes row locks and never writes.
#[derive(Clone)]
pub struct SeatService {
    repo: Arc<dyn SeatRepository>,
    clock: Arc<dyn Clock>,
    hold_duration: Duration,
}

impl SeatService {
    pub fn new(repo: Arc<dyn SeatRepository>, clock: Arc<dyn Clock>, config: &BookingConfig) -> Self {
        Self {
            repo,
            clock,
            hold_duration: config.hold_duration(),
        }
    }

    pub async fn list_seats_for_show(&self, show_id: i64) -> Result<Vec<SeatView>, BookingError> {
        let seats = self.repo.list_seats_for_show(show_id).await?;
        let now = self.clock.now();
        Ok(seats
            .into_iter()
            .map(|seat| hold_policy::display_view(seat, now, self.hold_duration))
            .collect())
    }
}
