//! Data Transfer Objects for REST request/response serialization.
//!
//! Money amounts are serialized as JSON strings to keep decimal precision.

pub mod booking_dto;
pub mod common_dto;

pub use booking_dto::*;
pub use common_dto::*;
