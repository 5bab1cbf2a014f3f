//! Domain layer: identifiers, tools, bookings and the rules between them.
//!
//! Contains the booking status machine, the half-open overlap predicate,
//! per-day pricing and the injectable clock. Nothing in this module touches
//! storage or HTTP.

pub mod booking;
pub mod booking_status;
pub mod clock;
pub mod ids;
pub mod pricing;
pub mod tool;

pub use booking::{Booking, BookingQuery, BookingRole, TransitionPolicy};
pub use booking_status::BookingStatus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{BookingId, ToolId, UserId};
pub use pricing::PriceQuote;
pub use tool::Tool;
