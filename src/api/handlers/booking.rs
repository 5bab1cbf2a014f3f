//! Booking handlers: create, list, get, status change, delete and lender
//! stats.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::caller::Caller;
use crate::api::dto::{
    BookingListResponse, CreateBookingRequest, ListBookingsParams, UpdateStatusRequest,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::{Booking, BookingId};
use crate::error::{ErrorResponse, ServiceError};
use crate::service::LenderStats;

/// `POST /bookings` — Request a tool for a time window.
///
/// # Errors
///
/// Returns [`ServiceError`] if the tool is missing or the request fails
/// validation or overlaps a confirmed booking.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booking request",
    description = "Creates a pending booking. Price and deposit are computed from the tool's current daily rate and frozen on the booking. Rejected if a confirmed or active booking overlaps the window.",
    request_body = CreateBookingRequest,
    params(("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Validation failure or overlap", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Tool not found", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state
        .booking_service
        .create_booking(user, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /bookings` — List the caller's bookings.
///
/// # Errors
///
/// Returns [`ServiceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "List bookings",
    description = "Returns the caller's bookings newest first, filtered by role and status.",
    params(
        ("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user"),
        ListBookingsParams,
    ),
    responses(
        (status = 200, description = "Paginated booking list", body = BookingListResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiQuery(params): ApiQuery<ListBookingsParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .booking_service
        .list_bookings(user, params.into())
        .await?;
    Ok(Json(BookingListResponse::from(page)))
}

/// `GET /bookings/:id` — Get one booking.
///
/// # Errors
///
/// Returns [`ServiceError::BookingNotFound`] or [`ServiceError::Forbidden`].
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Get booking details",
    description = "Returns a booking the caller is the borrower or lender of.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Booking details", body = Booking),
        (status = 403, description = "Caller is not a participant", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state.booking_service.get_booking(user, id).await?;
    Ok(Json(booking))
}

/// `PUT /bookings/:id/status` — Move a booking through its lifecycle.
///
/// # Errors
///
/// Returns [`ServiceError`] on a role violation or a transition the
/// status table does not allow.
#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    summary = "Change booking status",
    description = "Only the lender may confirm; borrower or lender may cancel. Transitions follow pending → confirmed → active → completed, with cancellation from pending, confirmed or active.",
    request_body = UpdateStatusRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated booking", body = Booking),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 403, description = "Caller may not make this change", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<BookingId>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = state
        .booking_service
        .update_status(user, id, req.status)
        .await?;
    Ok(Json(booking))
}

/// `DELETE /bookings/:id` — Withdraw a pending request.
///
/// # Errors
///
/// Returns [`ServiceError`] unless the caller is the borrower and the
/// booking is pending.
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Delete a pending booking",
    description = "Removes a pending booking. Only its borrower may do this.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 400, description = "Booking is not pending", body = ErrorResponse),
        (status = 403, description = "Caller is not the borrower", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<impl IntoResponse, ServiceError> {
    state.booking_service.delete_booking(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /bookings/stats` — Lender dashboard figures.
///
/// # Errors
///
/// Returns [`ServiceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/stats",
    tag = "Bookings",
    summary = "Lender booking stats",
    description = "Counts the bookings on the caller's tools by status and sums earnings from completed rentals.",
    params(("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Lender stats", body = LenderStats),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
    )
)]
pub async fn lender_stats(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.booking_service.lender_stats(user).await?;
    Ok(Json(stats))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/stats", get(lender_stats))
        .route("/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/bookings/{id}/status", put(update_status))
}
