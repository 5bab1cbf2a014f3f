//! # toolshare-bookings
//!
//! Booking lifecycle and conflict-resolution engine for a peer-to-peer
//! tool-rental marketplace.
//!
//! Borrowers request a tool for a time window; the lender confirms or
//! declines. Pending requests never reserve a slot, so several may compete
//! for the same window. Once a booking is confirmed, overlapping requests
//! are refused. Price and deposit are frozen on the booking at creation.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, X-User-Id header)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── BookingService (service/)
//!     ├── Status machine, overlap, pricing, clock (domain/)
//!     │
//!     ├── ToolDirectory + BookingStore (persistence/)
//!     │
//!     └── MemoryStore │ PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
