//! In-memory storage backend.
//!
//! [`MemoryStore`] keeps tools and bookings in `HashMap`s behind
//! [`tokio::sync::RwLock`]s. Every booking mutation holds the booking map's
//! write lock for its whole read-check-write sequence, which makes the
//! overlap check plus insert, and each guarded status change, atomic.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{BookingGuard, BookingStore, StatusTally, ToolDirectory};
use crate::domain::booking::OVERLAP_MESSAGE;
use crate::domain::{Booking, BookingId, BookingQuery, BookingStatus, Tool, ToolId, UserId};
use crate::error::ServiceError;

/// Process-local store for tools and bookings.
///
/// # Concurrency
///
/// - Reads of either map proceed concurrently.
/// - Booking writes are serialized on the booking map.
/// - Tool lookups never wait on booking writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tools: RwLock<HashMap<ToolId, Tool>>,
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `tools`.
    #[must_use]
    pub fn with_tools(tools: impl IntoIterator<Item = Tool>) -> Self {
        let tools = tools.into_iter().map(|tool| (tool.id, tool)).collect();
        Self {
            tools: RwLock::new(tools),
            bookings: RwLock::new(HashMap::new()),
        }
    }

    /// Loads a JSON array of tools from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if the file cannot be read, is
    /// not a valid tool catalogue, or lists a tool with a negative rate or
    /// deposit.
    pub async fn from_catalog_file(path: &Path) -> Result<Self, ServiceError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ServiceError::Internal(format!("cannot read tool catalog {}: {e}", path.display()))
        })?;
        let tools: Vec<Tool> = serde_json::from_str(&raw).map_err(|e| {
            ServiceError::Internal(format!("invalid tool catalog {}: {e}", path.display()))
        })?;
        for tool in &tools {
            tool.check_pricing().map_err(|reason| {
                ServiceError::Internal(format!(
                    "invalid tool {} in catalog {}: {reason}",
                    tool.id,
                    path.display()
                ))
            })?;
        }
        tracing::info!(count = tools.len(), path = %path.display(), "tool catalog loaded");
        Ok(Self::with_tools(tools))
    }

    /// Adds or replaces a tool listing.
    pub async fn put_tool(&self, tool: Tool) {
        self.tools.write().await.insert(tool.id, tool);
    }

    /// Returns the number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl ToolDirectory for MemoryStore {
    async fn get_tool(&self, tool_id: ToolId) -> Result<Tool, ServiceError> {
        self.tools
            .read()
            .await
            .get(&tool_id)
            .cloned()
            .ok_or(ServiceError::ToolNotFound(*tool_id.as_uuid()))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_unless_blocked(&self, booking: Booking) -> Result<Booking, ServiceError> {
        let mut map = self.bookings.write().await;
        if map
            .values()
            .any(|existing| existing.blocks(booking.tool_id, booking.start_date, booking.end_date))
        {
            return Err(ServiceError::invalid(OVERLAP_MESSAGE));
        }
        if map.contains_key(&booking.id) {
            return Err(ServiceError::Internal(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        map.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find(&self, booking_id: BookingId) -> Result<Option<Booking>, ServiceError> {
        Ok(self.bookings.read().await.get(&booking_id).cloned())
    }

    async fn list(&self, query: &BookingQuery) -> Result<(Vec<Booking>, u64), ServiceError> {
        let map = self.bookings.read().await;
        let mut matched: Vec<&Booking> = map.values().filter(|b| query.matches(b)).collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matched.len() as u64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let page = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
        guard: BookingGuard<'_>,
    ) -> Result<Booking, ServiceError> {
        let mut map = self.bookings.write().await;
        let booking = map
            .get_mut(&booking_id)
            .ok_or(ServiceError::BookingNotFound(*booking_id.as_uuid()))?;
        guard(booking)?;
        booking.status = status;
        booking.updated_at = updated_at;
        Ok(booking.clone())
    }

    async fn delete(
        &self,
        booking_id: BookingId,
        guard: BookingGuard<'_>,
    ) -> Result<Booking, ServiceError> {
        let mut map = self.bookings.write().await;
        let booking = map
            .get(&booking_id)
            .ok_or(ServiceError::BookingNotFound(*booking_id.as_uuid()))?;
        guard(booking)?;
        map.remove(&booking_id)
            .ok_or(ServiceError::BookingNotFound(*booking_id.as_uuid()))
    }

    async fn blocking_for_tool(&self, tool_id: ToolId) -> Result<Vec<Booking>, ServiceError> {
        let map = self.bookings.read().await;
        let mut slots: Vec<Booking> = map
            .values()
            .filter(|b| b.tool_id == tool_id && b.status.blocks_slot())
            .cloned()
            .collect();
        slots.sort_by_key(|b| (b.start_date, b.end_date));
        Ok(slots)
    }

    async fn lender_tallies(&self, lender: UserId) -> Result<Vec<StatusTally>, ServiceError> {
        let map = self.bookings.read().await;
        let mut tallies: HashMap<BookingStatus, (u64, Decimal)> = HashMap::new();
        for booking in map.values().filter(|b| b.lender_id == lender) {
            let entry = tallies.entry(booking.status).or_insert((0, Decimal::ZERO));
            entry.0 = entry.0.saturating_add(1);
            entry.1 += booking.total_price;
        }
        Ok(tallies
            .into_iter()
            .map(|(status, (count, total_price))| StatusTally {
                status,
                count,
                total_price,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::booking::DEFAULT_DELIVERY_METHOD;
    use crate::domain::{BookingRole, pricing};
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        let Some(ts) = Utc.with_ymd_and_hms(2030, 1, day, hour, 0, 0).single() else {
            panic!("valid timestamp");
        };
        ts
    }

    fn make_tool() -> Tool {
        Tool::new(UserId::new(), "drill", Decimal::from(10))
    }

    fn make_booking(tool: &Tool, start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        let quote = pricing::quote(tool, start, end);
        Booking::pending(
            tool,
            UserId::new(),
            (start, end),
            &quote,
            DEFAULT_DELIVERY_METHOD.to_string(),
            at(1, 0),
        )
    }

    fn accept_all(_: &Booking) -> Result<(), ServiceError> {
        Ok(())
    }

    #[tokio::test]
    async fn get_tool_and_missing_tool() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let Ok(found) = store.get_tool(tool.id).await else {
            panic!("tool should exist");
        };
        assert_eq!(found, tool);
        assert!(matches!(
            store.get_tool(ToolId::new()).await,
            Err(ServiceError::ToolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_and_find() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let booking = make_booking(&tool, at(10, 0), at(12, 0));
        let id = booking.id;

        assert!(store.insert_unless_blocked(booking).await.is_ok());
        let Ok(Some(found)) = store.find(id).await else {
            panic!("booking should be stored");
        };
        assert_eq!(found.id, id);
        assert!(matches!(store.find(BookingId::new()).await, Ok(None)));
    }

    #[tokio::test]
    async fn pending_bookings_do_not_block_inserts() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let first = make_booking(&tool, at(10, 0), at(12, 0));
        let second = make_booking(&tool, at(11, 0), at(13, 0));
        assert!(store.insert_unless_blocked(first).await.is_ok());
        assert!(store.insert_unless_blocked(second).await.is_ok());
        assert_eq!(store.booking_count().await, 2);
    }

    #[tokio::test]
    async fn confirmed_booking_blocks_overlapping_insert() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let mut first = make_booking(&tool, at(10, 10), at(10, 12));
        first.status = BookingStatus::Confirmed;
        let _ = store.insert_unless_blocked(first).await;

        let overlapping = make_booking(&tool, at(10, 11), at(10, 13));
        let Err(err) = store.insert_unless_blocked(overlapping).await else {
            panic!("overlap must be rejected");
        };
        assert!(err.to_string().contains(OVERLAP_MESSAGE));

        let touching = make_booking(&tool, at(10, 12), at(10, 14));
        assert!(store.insert_unless_blocked(touching).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_inserts_against_confirmed_slot_all_fail() {
        let tool = make_tool();
        let store = Arc::new(MemoryStore::with_tools([tool.clone()]));
        let mut confirmed = make_booking(&tool, at(10, 0), at(12, 0));
        confirmed.status = BookingStatus::Confirmed;
        let _ = store.insert_unless_blocked(confirmed).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let booking = make_booking(&tool, at(11, 0), at(13, 0));
            handles.push(tokio::spawn(async move {
                store.insert_unless_blocked(booking).await.is_ok()
            }));
        }
        for handle in handles {
            let Ok(inserted) = handle.await else {
                panic!("task panicked");
            };
            assert!(!inserted);
        }
        assert_eq!(store.booking_count().await, 1);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_paginates() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let lender = tool.owner_id;
        for i in 0..5 {
            let mut b = make_booking(&tool, at(10, 0), at(12, 0));
            b.created_at = at(1, 0) + Duration::hours(i);
            let _ = store.insert_unless_blocked(b).await;
        }

        let query = BookingQuery {
            user_id: lender,
            role: BookingRole::Lender,
            status: None,
            offset: 2,
            limit: 2,
        };
        let Ok((page, total)) = store.list(&query).await else {
            panic!("list failed");
        };
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|b| b.lender_id == lender));
        let hours: Vec<_> = page
            .iter()
            .map(|b| (b.created_at - at(1, 0)).num_hours())
            .collect();
        assert_eq!(hours, vec![2, 1]);
    }

    #[tokio::test]
    async fn update_status_applies_guard_atomically() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let booking = make_booking(&tool, at(10, 0), at(12, 0));
        let id = booking.id;
        let _ = store.insert_unless_blocked(booking).await;

        let reject =
            |_: &Booking| -> Result<(), ServiceError> { Err(ServiceError::invalid("nope")) };
        assert!(
            store
                .update_status(id, BookingStatus::Confirmed, at(2, 0), &reject)
                .await
                .is_err()
        );
        let Ok(Some(unchanged)) = store.find(id).await else {
            panic!("booking should exist");
        };
        assert_eq!(unchanged.status, BookingStatus::Pending);

        let Ok(updated) = store
            .update_status(id, BookingStatus::Confirmed, at(2, 0), &accept_all)
            .await
        else {
            panic!("update should succeed");
        };
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.updated_at, at(2, 0));
        assert!(matches!(
            store
                .update_status(BookingId::new(), BookingStatus::Active, at(2, 0), &accept_all)
                .await,
            Err(ServiceError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_respects_guard() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        let booking = make_booking(&tool, at(10, 0), at(12, 0));
        let id = booking.id;
        let _ = store.insert_unless_blocked(booking).await;

        let reject =
            |_: &Booking| -> Result<(), ServiceError> { Err(ServiceError::forbidden("no")) };
        assert!(store.delete(id, &reject).await.is_err());
        assert_eq!(store.booking_count().await, 1);

        assert!(store.delete(id, &accept_all).await.is_ok());
        assert_eq!(store.booking_count().await, 0);
        assert!(matches!(
            store.delete(id, &accept_all).await,
            Err(ServiceError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn blocking_for_tool_lists_confirmed_and_active_only() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        for (status, day) in [
            (BookingStatus::Pending, 10),
            (BookingStatus::Active, 14),
            (BookingStatus::Confirmed, 12),
            (BookingStatus::Cancelled, 16),
        ] {
            let mut b = make_booking(&tool, at(day, 0), at(day + 1, 0));
            b.status = status;
            let _ = store.insert_unless_blocked(b).await;
        }
        let Ok(slots) = store.blocking_for_tool(tool.id).await else {
            panic!("schedule failed");
        };
        let statuses: Vec<_> = slots.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![BookingStatus::Confirmed, BookingStatus::Active]
        );
    }

    #[tokio::test]
    async fn lender_tallies_group_by_status() {
        let tool = make_tool();
        let store = MemoryStore::with_tools([tool.clone()]);
        for (status, day) in [
            (BookingStatus::Completed, 10),
            (BookingStatus::Completed, 12),
            (BookingStatus::Pending, 14),
        ] {
            let mut b = make_booking(&tool, at(day, 0), at(day + 1, 0));
            b.status = status;
            let _ = store.insert_unless_blocked(b).await;
        }
        let Ok(tallies) = store.lender_tallies(tool.owner_id).await else {
            panic!("tallies failed");
        };
        let Some(completed) = tallies
            .iter()
            .find(|t| t.status == BookingStatus::Completed)
        else {
            panic!("completed tally missing");
        };
        assert_eq!(completed.count, 2);
        assert_eq!(completed.total_price, Decimal::from(20));
        assert!(
            store
                .lender_tallies(UserId::new())
                .await
                .is_ok_and(|t| t.is_empty())
        );
    }

    #[tokio::test]
    async fn catalog_with_negative_rate_is_refused() {
        let path = std::env::temp_dir().join(format!("tools-{}.json", uuid::Uuid::new_v4()));
        let tool_id = ToolId::new();
        let catalog = serde_json::json!([{
            "id": tool_id,
            "owner_id": UserId::new(),
            "name": "drill",
            "is_available": true,
            "price_per_day": "-10",
        }]);
        let Ok(()) = tokio::fs::write(&path, catalog.to_string()).await else {
            panic!("temp file should be writable");
        };

        let result = MemoryStore::from_catalog_file(&path).await;
        let _ = tokio::fs::remove_file(&path).await;

        match result {
            Err(ServiceError::Internal(msg)) => {
                assert!(msg.contains(&tool_id.to_string()));
                assert!(msg.contains("price_per_day must not be negative"));
            }
            other => panic!("expected Internal, got {other:?}"),
        }
    }
}
