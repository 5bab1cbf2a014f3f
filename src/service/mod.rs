//! Service layer: business logic orchestration.
//!
//! [`BookingService`] validates requests against the domain rules, prices
//! bookings and drives the storage traits in [`crate::persistence`].

pub mod booking_service;

pub use booking_service::{
    BookingPage, BookingService, LenderStats, ListBookings, NewBooking, ScheduledSlot,
};
