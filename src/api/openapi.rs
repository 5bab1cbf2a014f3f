//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    BookingListResponse, CreateBookingRequest, PaginationMeta, QuoteRequest, UpdateStatusRequest,
};
use crate::api::handlers::{booking, system, tool};
use crate::domain::{Booking, BookingRole, BookingStatus, PriceQuote};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::{LenderStats, ScheduledSlot};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "toolshare-bookings",
        description = "Booking lifecycle and conflict-resolution engine for peer-to-peer tool rental."
    ),
    paths(
        booking::create_booking,
        booking::list_bookings,
        booking::get_booking,
        booking::update_status,
        booking::delete_booking,
        booking::lender_stats,
        tool::quote_booking,
        tool::tool_schedule,
        system::health_handler,
    ),
    components(schemas(
        Booking,
        BookingStatus,
        BookingRole,
        PriceQuote,
        CreateBookingRequest,
        UpdateStatusRequest,
        QuoteRequest,
        BookingListResponse,
        PaginationMeta,
        LenderStats,
        ScheduledSlot,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Bookings", description = "Booking requests and their lifecycle"),
        (name = "Tools", description = "Per-tool pricing and schedule"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
