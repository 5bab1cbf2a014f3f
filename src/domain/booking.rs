//! Booking aggregate and the rules that govern it.
//!
//! Everything here is pure: no storage, no clock. The service layer feeds in
//! the current time and the tool, and persists what these functions allow.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pricing::{PriceQuote, billable_days};
use super::{BookingId, BookingStatus, Tool, ToolId, UserId};
use crate::error::ServiceError;

/// Delivery method recorded when the borrower does not specify one.
pub const DEFAULT_DELIVERY_METHOD: &str = "pickup";

/// Longest accepted delivery method string.
pub const MAX_DELIVERY_METHOD_LEN: usize = 50;

/// A time-bounded rental of one tool by one borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Tool being rented.
    pub tool_id: ToolId,
    /// User renting the tool.
    pub borrower_id: UserId,
    /// Tool owner at creation time.
    pub lender_id: UserId,
    /// Inclusive start of the rental window.
    pub start_date: DateTime<Utc>,
    /// Exclusive end of the rental window. Always after `start_date`.
    pub end_date: DateTime<Utc>,
    /// Price frozen at creation.
    pub total_price: Decimal,
    /// Deposit frozen at creation.
    pub security_deposit: Decimal,
    /// How the tool changes hands (e.g. `"pickup"`, `"delivery"`).
    pub delivery_method: String,
    /// Current lifecycle state.
    pub status: BookingStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a new `pending` booking of `tool` for `borrower`.
    ///
    /// Lender and deposit are copied from the tool; price comes from `quote`.
    #[must_use]
    pub fn pending(
        tool: &Tool,
        borrower: UserId,
        window: (DateTime<Utc>, DateTime<Utc>),
        quote: &PriceQuote,
        delivery_method: String,
        now: DateTime<Utc>,
    ) -> Self {
        let (start_date, end_date) = window;
        Self {
            id: BookingId::new(),
            tool_id: tool.id,
            borrower_id: borrower,
            lender_id: tool.owner_id,
            start_date,
            end_date,
            total_price: quote.total_price,
            security_deposit: quote.security_deposit,
            delivery_method,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if `user` is the borrower or the lender.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.borrower_id == user || self.lender_id == user
    }

    /// Returns `true` if this booking's window overlaps `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        windows_overlap((self.start_date, self.end_date), (start, end))
    }

    /// Returns `true` if this booking prevents a new request for
    /// `[start, end)` on the same tool.
    #[must_use]
    pub fn blocks(&self, tool_id: ToolId, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.tool_id == tool_id && self.status.blocks_slot() && self.overlaps(start, end)
    }
}

/// Half-open interval overlap: touching endpoints do not overlap.
#[must_use]
pub fn windows_overlap(
    a: (DateTime<Utc>, DateTime<Utc>),
    b: (DateTime<Utc>, DateTime<Utc>),
) -> bool {
    a.0 < b.1 && a.1 > b.0
}

/// Longest rental window accepted, in billable days.
pub const MAX_BOOKING_DAYS: i64 = 365;

/// Largest total price a booking may carry (fits `NUMERIC(12,2)`).
pub const MAX_TOTAL_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Error message for an overlapping request.
pub const OVERLAP_MESSAGE: &str = "tool is already booked for this period";

/// Checks a booking request against the tool and the clock.
///
/// Checks run in a fixed order and the first failure wins: availability,
/// self-booking, window ordering, window length, start in the past. The
/// overlap check is not here because it must run atomically with the insert.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] naming the failed rule.
pub fn validate_request(
    tool: &Tool,
    borrower: UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if !tool.is_available {
        return Err(ServiceError::invalid("tool not available"));
    }
    if tool.is_owned_by(borrower) {
        return Err(ServiceError::invalid("cannot book own tool"));
    }
    if start >= end {
        return Err(ServiceError::invalid("end date must be after start date"));
    }
    if billable_days(start, end) > MAX_BOOKING_DAYS {
        return Err(ServiceError::invalid(format!(
            "booking cannot exceed {MAX_BOOKING_DAYS} days"
        )));
    }
    if start < now {
        return Err(ServiceError::invalid("start date in the past"));
    }
    Ok(())
}

/// Rejects a quote whose total cannot be stored.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] if `total_price` exceeds
/// [`MAX_TOTAL_PRICE`].
pub fn check_quote(quote: &PriceQuote) -> Result<(), ServiceError> {
    if quote.total_price > MAX_TOTAL_PRICE {
        return Err(ServiceError::invalid("booking price exceeds the supported maximum"));
    }
    Ok(())
}

/// Normalizes the optional delivery method.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] if the value is blank or longer
/// than [`MAX_DELIVERY_METHOD_LEN`].
pub fn delivery_method(requested: Option<&str>) -> Result<String, ServiceError> {
    let Some(raw) = requested else {
        return Ok(DEFAULT_DELIVERY_METHOD.to_string());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid("delivery method must not be empty"));
    }
    if trimmed.chars().count() > MAX_DELIVERY_METHOD_LEN {
        return Err(ServiceError::invalid(format!(
            "delivery method must be at most {MAX_DELIVERY_METHOD_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Who may move a booking into `active` or `completed`.
///
/// Confirming always requires the lender and cancelling always requires a
/// participant; this only governs the remaining forward moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any authenticated caller may start or complete a rental.
    #[default]
    Permissive,
    /// Only the borrower or the lender may start or complete a rental.
    Participants,
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "participants" => Ok(Self::Participants),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

/// Decides whether `requester` may move `booking` to `target`.
///
/// Role checks come first, then the transition table, so an outsider probing
/// a terminal booking learns nothing about its state.
///
/// # Errors
///
/// Returns [`ServiceError::Forbidden`] on a role violation and
/// [`ServiceError::InvalidRequest`] if the table forbids the move.
pub fn authorize_transition(
    booking: &Booking,
    requester: UserId,
    target: BookingStatus,
    policy: TransitionPolicy,
) -> Result<(), ServiceError> {
    match target {
        BookingStatus::Confirmed if booking.lender_id != requester => {
            return Err(ServiceError::forbidden(
                "only the lender can confirm bookings",
            ));
        }
        BookingStatus::Cancelled if !booking.involves(requester) => {
            return Err(ServiceError::forbidden(
                "only the borrower or lender can cancel bookings",
            ));
        }
        BookingStatus::Active | BookingStatus::Completed
            if policy == TransitionPolicy::Participants && !booking.involves(requester) =>
        {
            return Err(ServiceError::forbidden(format!(
                "only the borrower or lender can mark bookings {target}"
            )));
        }
        _ => {}
    }

    if !booking.status.can_transition_to(target) {
        return Err(ServiceError::invalid(format!(
            "cannot change status from {} to {target}",
            booking.status
        )));
    }
    Ok(())
}

/// Decides whether `requester` may delete `booking`.
///
/// # Errors
///
/// Returns [`ServiceError::Forbidden`] unless the requester is the borrower,
/// and [`ServiceError::InvalidRequest`] unless the booking is still pending.
pub fn authorize_delete(booking: &Booking, requester: UserId) -> Result<(), ServiceError> {
    if booking.borrower_id != requester {
        return Err(ServiceError::forbidden(
            "not authorized to delete this booking",
        ));
    }
    if booking.status != BookingStatus::Pending {
        return Err(ServiceError::invalid("can only delete pending bookings"));
    }
    Ok(())
}

/// Which side of a booking the caller wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingRole {
    /// Bookings where the caller is borrower or lender.
    #[default]
    All,
    /// Bookings the caller placed.
    Borrower,
    /// Bookings on the caller's tools.
    Lender,
}

impl BookingRole {
    /// Returns `true` if `booking` belongs to `user` under this role.
    #[must_use]
    pub fn matches(self, booking: &Booking, user: UserId) -> bool {
        match self {
            Self::All => booking.involves(user),
            Self::Borrower => booking.borrower_id == user,
            Self::Lender => booking.lender_id == user,
        }
    }

    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Borrower => "borrower",
            Self::Lender => "lender",
        }
    }
}

/// A page request over a user's bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingQuery {
    /// The caller.
    pub user_id: UserId,
    /// Which side of the booking the caller is on.
    pub role: BookingRole,
    /// Optional exact status filter.
    pub status: Option<BookingStatus>,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

impl BookingQuery {
    /// Returns `true` if `booking` passes the role and status filters.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.role.matches(booking, self.user_id)
            && self.status.is_none_or(|status| booking.status == status)
    }
}
