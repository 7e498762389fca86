pub mod booking;
pub mod movie;
pub mod seat;
pub mod showtime;
pub mod theater;

pub use booking::{BookingConfirmation, BookingRequest, PaymentMethod};
pub use movie::{filter_by_release, Movie, ReleaseStatus};
pub use seat::{Seat, SeatCategory, SeatCounts, SeatId, SeatPricing, SeatStatus};
pub use showtime::{group_by_date, Showtime, ShowtimesOnDate};
pub use theater::Theater;
