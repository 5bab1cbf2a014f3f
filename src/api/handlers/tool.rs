//! Tool-scoped handlers: price quote and booked schedule.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::caller::Caller;
use crate::api::dto::QuoteRequest;
use crate::api::extract::{ApiJson, ApiPath};
use crate::app_state::AppState;
use crate::domain::{PriceQuote, ToolId};
use crate::error::{ErrorResponse, ServiceError};
use crate::service::ScheduledSlot;

/// `POST /tools/:id/quote` — Price a prospective booking.
///
/// # Errors
///
/// Returns [`ServiceError`] if the tool is missing or the window fails
/// validation.
#[utoipa::path(
    post,
    path = "/api/v1/tools/{id}/quote",
    tag = "Tools",
    summary = "Quote a booking",
    description = "Runs the booking validations and pricing without creating anything. Does not check for overlap.",
    request_body = QuoteRequest,
    params(
        ("id" = uuid::Uuid, Path, description = "Tool UUID"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Price quote", body = PriceQuote),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 404, description = "Tool not found", body = ErrorResponse),
    )
)]
pub async fn quote_booking(
    State(state): State<AppState>,
    Caller(user): Caller,
    ApiPath(id): ApiPath<ToolId>,
    ApiJson(req): ApiJson<QuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quote = state
        .booking_service
        .quote_booking(user, id, req.start_date, req.end_date)
        .await?;
    Ok(Json(quote))
}

/// `GET /tools/:id/bookings` — Slots during which a tool is taken.
///
/// # Errors
///
/// Returns [`ServiceError::ToolNotFound`] if the tool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/tools/{id}/bookings",
    tag = "Tools",
    summary = "Tool schedule",
    description = "Lists confirmed and active bookings on a tool, earliest first. Borrower identities are not included.",
    params(("id" = uuid::Uuid, Path, description = "Tool UUID")),
    responses(
        (status = 200, description = "Booked slots", body = Vec<ScheduledSlot>),
        (status = 404, description = "Tool not found", body = ErrorResponse),
    )
)]
pub async fn tool_schedule(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ToolId>,
) -> Result<impl IntoResponse, ServiceError> {
    let slots = state.booking_service.tool_schedule(id).await?;
    Ok(Json(slots))
}

/// Tool routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tools/{id}/quote", post(quote_booking))
        .route("/tools/{id}/bookings", get(tool_schedule))
}
