//! Booking DTOs for create, list, status change, quote and dashboard
//! endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{Booking, BookingRole, BookingStatus, ToolId};
use crate::service::booking_service::DEFAULT_PER_PAGE;
use crate::service::{BookingPage, ListBookings, NewBooking};

/// Request body for `POST /bookings`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Tool to rent.
    pub tool_id: ToolId,
    /// Rental start (RFC 3339).
    pub start_date: DateTime<Utc>,
    /// Rental end (RFC 3339, exclusive).
    pub end_date: DateTime<Utc>,
    /// Hand-over method. Defaults to `"pickup"`.
    #[serde(default)]
    pub delivery_method: Option<String>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            tool_id: req.tool_id,
            start_date: req.start_date,
            end_date: req.end_date,
            delivery_method: req.delivery_method,
        }
    }
}

/// Request body for `PUT /bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status.
    pub status: BookingStatus,
}

/// Query parameters for `GET /bookings`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsParams {
    /// `borrower`, `lender` or `all` (default). Also accepted as `type`.
    #[serde(default, alias = "type")]
    pub role: BookingRole,
    /// Exact status filter.
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Paging bounds are enforced by [`crate::service::BookingService::list_bookings`].
impl From<ListBookingsParams> for ListBookings {
    fn from(params: ListBookingsParams) -> Self {
        Self {
            role: params.role,
            status: params.status,
            page: params.page.unwrap_or(1),
            per_page: params.per_page.unwrap_or(DEFAULT_PER_PAGE),
        }
    }
}

/// Paginated list response for `GET /bookings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingListResponse {
    /// Bookings on this page, newest first.
    pub data: Vec<Booking>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

impl From<BookingPage> for BookingListResponse {
    fn from(page: BookingPage) -> Self {
        Self {
            pagination: PaginationMeta {
                page: page.page,
                per_page: page.per_page,
                total: page.total,
                total_pages: page.page_count,
            },
            data: page.items,
        }
    }
}

/// Request body for `POST /tools/{id}/quote`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuoteRequest {
    /// Prospective rental start.
    pub start_date: DateTime<Utc>,
    /// Prospective rental end.
    pub end_date: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn list_params_accept_type_alias() {
        let Ok(params) = serde_json::from_str::<ListBookingsParams>(
            r#"{"type":"lender","status":"confirmed","per_page":500}"#,
        ) else {
            panic!("params should parse");
        };
        let list = ListBookings::from(params);
        assert_eq!(list.role, BookingRole::Lender);
        assert_eq!(list.status, Some(BookingStatus::Confirmed));
        assert_eq!(list.page, 1);
        assert_eq!(list.per_page, 500);
    }

    #[test]
    fn list_params_default_to_everything() {
        let Ok(params) = serde_json::from_str::<ListBookingsParams>("{}") else {
            panic!("params should parse");
        };
        let list = ListBookings::from(params);
        assert_eq!(list.role, BookingRole::All);
        assert_eq!(list.status, None);
        assert_eq!(list.per_page, 20);
    }

    #[test]
    fn create_request_leaves_delivery_optional() {
        let body = format!(
            r#"{{"tool_id":"{}","start_date":"2024-01-10T00:00:00Z","end_date":"2024-01-12T00:00:00Z"}}"#,
            ToolId::new()
        );
        let Ok(req) = serde_json::from_str::<CreateBookingRequest>(&body) else {
            panic!("request should parse");
        };
        assert!(req.delivery_method.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status":"archived"}"#).is_err());
    }
}
