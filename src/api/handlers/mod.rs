//! REST endpoint handlers organized by resource.

pub mod booking;
pub mod system;
pub mod tool;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(booking::routes())
        .merge(tool::routes())
}
