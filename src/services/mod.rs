pub mod auth;
pub mod hold_policy;
pub mod reservation;
pub mod seats;
pub mod settlement;

pub use auth::{AuthService, JwtKeys};
pub use reservation::{LockSeatResponse, ReservationEngine};
pub use seats::SeatService;
pub use settlement::{BookingResponse, BookingStatus, CreateBookingInput, SettlementEngine};
