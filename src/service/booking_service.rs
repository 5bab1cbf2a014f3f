//! Booking service: the booking lifecycle and conflict-resolution engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::booking;
use crate::domain::{
    Booking, BookingId, BookingQuery, BookingRole, BookingStatus, Clock, PriceQuote, ToolId,
    TransitionPolicy, UserId, pricing,
};
use crate::error::ServiceError;
use crate::persistence::{BookingStore, ToolDirectory};

/// Default page size for booking lists.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Maximum page size for booking lists.
pub const MAX_PER_PAGE: u32 = 100;

/// Input for [`BookingService::create_booking`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Tool to rent.
    pub tool_id: ToolId,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end.
    pub end_date: DateTime<Utc>,
    /// Optional hand-over method; defaults to `"pickup"`.
    pub delivery_method: Option<String>,
}

/// Listing request for [`BookingService::list_bookings`].
#[derive(Debug, Clone, Copy)]
pub struct ListBookings {
    /// Which side of the booking the caller is on.
    pub role: BookingRole,
    /// Optional exact status filter.
    pub status: Option<BookingStatus>,
    /// 1-indexed page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

impl Default for ListBookings {
    fn default() -> Self {
        Self {
            role: BookingRole::All,
            status: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of bookings.
#[derive(Debug, Clone)]
pub struct BookingPage {
    /// Bookings on this page, newest first.
    pub items: Vec<Booking>,
    /// Total matching bookings across all pages.
    pub total: u64,
    /// Number of pages at the effective page size.
    pub page_count: u64,
    /// Effective (clamped) page number.
    pub page: u32,
    /// Effective (clamped) page size.
    pub per_page: u32,
}

/// A time slot during which a tool is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScheduledSlot {
    /// Booking holding the slot.
    pub booking_id: BookingId,
    /// Slot start.
    pub start_date: DateTime<Utc>,
    /// Slot end (exclusive).
    pub end_date: DateTime<Utc>,
    /// `confirmed` or `active`.
    pub status: BookingStatus,
}

/// Booking figures for a lender's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LenderStats {
    /// Bookings on the lender's tools, any status.
    pub total_bookings: u64,
    /// Requests awaiting the lender's decision.
    pub pending_requests: u64,
    /// Confirmed, not yet started.
    pub confirmed: u64,
    /// Currently rented out.
    pub active: u64,
    /// Finished rentals.
    pub completed: u64,
    /// Cancelled bookings.
    pub cancelled: u64,
    /// Sum of `total_price` over completed bookings.
    pub total_earnings: Decimal,
}

/// Orchestration layer for all booking operations.
///
/// Stateless coordinator: holds the tool directory, the booking store, a
/// clock and the transition policy. Every operation takes the caller's
/// identity explicitly. Mutations follow the pattern: load tool or
/// booking → validate with the domain rules → hand an atomic unit to the
/// store → log.
#[derive(Debug, Clone)]
pub struct BookingService {
    tools: Arc<dyn ToolDirectory>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    policy: TransitionPolicy,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(
        tools: Arc<dyn ToolDirectory>,
        bookings: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            tools,
            bookings,
            clock,
            policy,
        }
    }

    /// Places a booking request for `borrower`.
    ///
    /// The new booking is `pending`; it does not reserve the slot, and the
    /// tool stays available for other requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ToolNotFound`] if the tool does not exist,
    /// or [`ServiceError::InvalidRequest`] if the tool is unavailable, owned
    /// by the borrower, the window is empty or in the past, the delivery
    /// method is malformed, or a confirmed/active booking overlaps.
    pub async fn create_booking(
        &self,
        borrower: UserId,
        request: NewBooking,
    ) -> Result<Booking, ServiceError> {
        let tool = self.tools.get_tool(request.tool_id).await?;
        let now = self.clock.now();
        booking::validate_request(&tool, borrower, request.start_date, request.end_date, now)?;
        let delivery_method = booking::delivery_method(request.delivery_method.as_deref())?;

        let quote = pricing::quote(&tool, request.start_date, request.end_date);
        booking::check_quote(&quote)?;
        let candidate = Booking::pending(
            &tool,
            borrower,
            (request.start_date, request.end_date),
            &quote,
            delivery_method,
            now,
        );

        let created = self.bookings.insert_unless_blocked(candidate).await?;

        tracing::info!(
            booking_id = %created.id,
            tool_id = %created.tool_id,
            %borrower,
            lender = %created.lender_id,
            total_price = %created.total_price,
            "booking created"
        );
        Ok(created)
    }

    /// Prices a prospective booking without storing anything.
    ///
    /// Runs the same checks as [`Self::create_booking`] except the overlap
    /// check.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ToolNotFound`] or
    /// [`ServiceError::InvalidRequest`] as for `create_booking`.
    pub async fn quote_booking(
        &self,
        borrower: UserId,
        tool_id: ToolId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceQuote, ServiceError> {
        let tool = self.tools.get_tool(tool_id).await?;
        booking::validate_request(&tool, borrower, start, end, self.clock.now())?;
        let quote = pricing::quote(&tool, start, end);
        booking::check_quote(&quote)?;
        Ok(quote)
    }

    /// Lists the caller's bookings, newest first.
    ///
    /// `page` is clamped to at least 1 and `per_page` to `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] on storage failure.
    pub async fn list_bookings(
        &self,
        user: UserId,
        request: ListBookings,
    ) -> Result<BookingPage, ServiceError> {
        let page = request.page.max(1);
        let per_page = request.per_page.clamp(1, MAX_PER_PAGE);
        let query = BookingQuery {
            user_id: user,
            role: request.role,
            status: request.status,
            offset: u64::from(page - 1) * u64::from(per_page),
            limit: u64::from(per_page),
        };

        let (items, total) = self.bookings.list(&query).await?;
        Ok(BookingPage {
            items,
            total,
            page_count: total.div_ceil(u64::from(per_page)),
            page,
            per_page,
        })
    }

    /// Fetches a booking the caller takes part in.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BookingNotFound`] if absent, or
    /// [`ServiceError::Forbidden`] if the caller is neither borrower nor
    /// lender.
    pub async fn get_booking(
        &self,
        requester: UserId,
        booking_id: BookingId,
    ) -> Result<Booking, ServiceError> {
        let booking = self
            .bookings
            .find(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(*booking_id.as_uuid()))?;
        if !booking.involves(requester) {
            return Err(ServiceError::forbidden(
                "not authorized to view this booking",
            ));
        }
        Ok(booking)
    }

    /// Moves a booking to `new_status`.
    ///
    /// The role check and the transition-table check run against the record
    /// as it is inside the store's lock, so two concurrent transitions on the
    /// same booking cannot both apply. Confirming does not re-check overlap
    /// with other bookings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BookingNotFound`] if absent,
    /// [`ServiceError::Forbidden`] on a role violation, or
    /// [`ServiceError::InvalidRequest`] if the transition table forbids it.
    pub async fn update_status(
        &self,
        requester: UserId,
        booking_id: BookingId,
        new_status: BookingStatus,
    ) -> Result<Booking, ServiceError> {
        let policy = self.policy;
        let guard = move |current: &Booking| {
            booking::authorize_transition(current, requester, new_status, policy)
        };
        let updated = self
            .bookings
            .update_status(booking_id, new_status, self.clock.now(), &guard)
            .await?;

        tracing::info!(
            %booking_id,
            %requester,
            status = %updated.status,
            "booking status changed"
        );
        Ok(updated)
    }

    /// Deletes a pending booking on behalf of its borrower.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::BookingNotFound`] if absent,
    /// [`ServiceError::Forbidden`] unless the caller is the borrower, or
    /// [`ServiceError::InvalidRequest`] unless the booking is pending.
    pub async fn delete_booking(
        &self,
        requester: UserId,
        booking_id: BookingId,
    ) -> Result<(), ServiceError> {
        let guard = move |current: &Booking| booking::authorize_delete(current, requester);
        self.bookings.delete(booking_id, &guard).await?;
        tracing::info!(%booking_id, %requester, "booking deleted");
        Ok(())
    }

    /// Returns the slots during which a tool is taken, earliest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ToolNotFound`] if the tool does not exist.
    pub async fn tool_schedule(&self, tool_id: ToolId) -> Result<Vec<ScheduledSlot>, ServiceError> {
        self.tools.get_tool(tool_id).await?;
        let slots = self
            .bookings
            .blocking_for_tool(tool_id)
            .await?
            .into_iter()
            .map(|b| ScheduledSlot {
                booking_id: b.id,
                start_date: b.start_date,
                end_date: b.end_date,
                status: b.status,
            })
            .collect();
        Ok(slots)
    }

    /// Summarizes the bookings on the caller's tools.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] on storage failure.
    pub async fn lender_stats(&self, lender: UserId) -> Result<LenderStats, ServiceError> {
        let tallies = self.bookings.lender_tallies(lender).await?;
        let mut stats = LenderStats::default();
        for tally in tallies {
            stats.total_bookings = stats.total_bookings.saturating_add(tally.count);
            match tally.status {
                BookingStatus::Pending => stats.pending_requests = tally.count,
                BookingStatus::Confirmed => stats.confirmed = tally.count,
                BookingStatus::Active => stats.active = tally.count,
                BookingStatus::Completed => {
                    stats.completed = tally.count;
                    stats.total_earnings = tally.total_price;
                }
                BookingStatus::Cancelled => stats.cancelled = tally.count,
            }
        }
        Ok(stats)
    }
}
