//! Persistence layer: tool lookup and booking storage.
//!
//! The engine talks to storage through two traits. [`ToolDirectory`] is the
//! read-only view of the tool catalogue; [`BookingStore`] owns booking
//! records and provides the atomic units the engine needs (overlap check plus
//! insert, guarded read-modify-write). Two backends implement both: the
//! in-memory [`MemoryStore`] and the PostgreSQL [`PostgresStore`].

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{Booking, BookingId, BookingQuery, BookingStatus, Tool, ToolId, UserId};
use crate::error::ServiceError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Check run against the current record inside a store's atomic unit.
///
/// Returning an error aborts the operation without writing anything.
pub type BookingGuard<'a> = &'a (dyn Fn(&Booking) -> Result<(), ServiceError> + Send + Sync);

/// Per-status aggregate over one lender's bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTally {
    /// Status the row aggregates.
    pub status: BookingStatus,
    /// Number of bookings in that status.
    pub count: u64,
    /// Sum of `total_price` over those bookings.
    pub total_price: Decimal,
}

/// Read-only access to the tool catalogue.
#[async_trait]
pub trait ToolDirectory: Debug + Send + Sync {
    /// Looks up a tool by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ToolNotFound`] if the tool does not exist, or
    /// [`ServiceError::Persistence`] on storage failure.
    async fn get_tool(&self, tool_id: ToolId) -> Result<Tool, ServiceError>;
}

/// Durable storage for bookings.
#[async_trait]
pub trait BookingStore: Debug + Send + Sync {
    /// Inserts `booking` unless a confirmed or active booking on the same
    /// tool overlaps its window. The check and the insert are one atomic
    /// unit.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRequest`] on overlap,
    /// [`ServiceError::ToolNotFound`] if the tool vanished, or
    /// [`ServiceError::Persistence`] on storage failure.
    async fn insert_unless_blocked(&self, booking: Booking) -> Result<Booking, ServiceError>;

    /// Fetches a booking by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] on storage failure.
    async fn find(&self, booking_id: BookingId) -> Result<Option<Booking>, ServiceError>;

    /// Returns one page of bookings matching `query`, newest first, along
    /// with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] on storage failure.
    async fn list(&self, query: &BookingQuery) -> Result<(Vec<Booking>, u64), ServiceError>;

    /// Sets the status of a booking if `guard` accepts the current record.
    /// Read, guard and write happen under one lock.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BookingNotFound`] if absent, whatever `guard`
    /// returns, or [`ServiceError::Persistence`] on storage failure.
    async fn update_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
        guard: BookingGuard<'_>,
    ) -> Result<Booking, ServiceError>;

    /// Deletes a booking if `guard` accepts the current record, returning the
    /// deleted record.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BookingNotFound`] if absent, whatever `guard`
    /// returns, or [`ServiceError::Persistence`] on storage failure.
    async fn delete(
        &self,
        booking_id: BookingId,
        guard: BookingGuard<'_>,
    ) -> Result<Booking, ServiceError>;

    /// Returns the confirmed and active bookings of a tool, earliest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] on storage failure.
    async fn blocking_for_tool(&self, tool_id: ToolId) -> Result<Vec<Booking>, ServiceError>;

    /// Aggregates the bookings where `lender` is the lender, by status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] on storage failure.
    async fn lender_tallies(&self, lender: UserId) -> Result<Vec<StatusTally>, ServiceError>;
}
