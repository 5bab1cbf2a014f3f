//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::BookingService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Booking service for all business logic.
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    /// Wraps a service for sharing across handlers.
    #[must_use]
    pub fn new(booking_service: BookingService) -> Self {
        Self {
            booking_service: Arc::new(booking_service),
        }
    }
}
