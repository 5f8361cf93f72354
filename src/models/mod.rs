pub mod booking;
pub mod movie;
pub mod seat;
pub mod show;
pub mod user;

pub use booking::{Booking, NewBooking};
pub use movie::Movie;
pub use seat::{Seat, SeatRow, SeatState, SeatStatus, SeatView};
pub use show::Show;
pub use user::User;
