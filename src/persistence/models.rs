//! Database row models for tools and bookings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Booking, BookingId, BookingStatus, Tool, ToolId, UserId};
use crate::error::ServiceError;

/// Column list for `bookings` queries, in [`BookingRow`] field order.
pub const BOOKING_COLUMNS: &str = "\
    id, tool_id, borrower_id, lender_id, start_date, end_date, \
    total_price, security_deposit, delivery_method, status, \
    created_at, updated_at";

/// Column list for `tools` queries, in [`ToolRow`] field order.
pub const TOOL_COLUMNS: &str = "\
    id, owner_id, name, is_available, price_per_hour, price_per_day, \
    price_per_week, security_deposit";

/// A row from the `tools` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ToolRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Display name.
    pub name: String,
    /// Availability flag.
    pub is_available: bool,
    /// Optional hourly rate.
    pub price_per_hour: Option<Decimal>,
    /// Daily rate.
    pub price_per_day: Decimal,
    /// Optional weekly rate.
    pub price_per_week: Option<Decimal>,
    /// Security deposit.
    pub security_deposit: Decimal,
}

impl From<ToolRow> for Tool {
    fn from(row: ToolRow) -> Self {
        Self {
            id: ToolId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            name: row.name,
            is_available: row.is_available,
            price_per_hour: row.price_per_hour,
            price_per_day: row.price_per_day,
            price_per_week: row.price_per_week,
            security_deposit: row.security_deposit,
        }
    }
}

/// A row from the `bookings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Booked tool.
    pub tool_id: Uuid,
    /// Borrowing user.
    pub borrower_id: Uuid,
    /// Lending user.
    pub lender_id: Uuid,
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end.
    pub end_date: DateTime<Utc>,
    /// Frozen price.
    pub total_price: Decimal,
    /// Frozen deposit.
    pub security_deposit: Decimal,
    /// Hand-over method.
    pub delivery_method: String,
    /// Status wire name.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = ServiceError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(ServiceError::Persistence)?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            tool_id: ToolId::from_uuid(row.tool_id),
            borrower_id: UserId::from_uuid(row.borrower_id),
            lender_id: UserId::from_uuid(row.lender_id),
            start_date: row.start_date,
            end_date: row.end_date,
            total_price: row.total_price,
            security_deposit: row.security_deposit,
            delivery_method: row.delivery_method,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn row(status: &str) -> BookingRow {
        let now = Utc::now();
        BookingRow {
            id: Uuid::new_v4(),
            tool_id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            lender_id: Uuid::new_v4(),
            start_date: now,
            end_date: now + chrono::Duration::days(1),
            total_price: Decimal::from(10),
            security_deposit: Decimal::ZERO,
            delivery_method: "pickup".to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn booking_row_converts() {
        let r = row("confirmed");
        let id = r.id;
        let Ok(booking) = Booking::try_from(r) else {
            panic!("row should convert");
        };
        assert_eq!(*booking.id.as_uuid(), id);
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn unknown_status_is_a_persistence_error() {
        assert!(matches!(
            Booking::try_from(row("archived")),
            Err(ServiceError::Persistence(_))
        ));
    }
}
