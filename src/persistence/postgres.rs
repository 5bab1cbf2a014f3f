//! PostgreSQL implementation of the persistence layer.
//!
//! Atomicity comes from transactions with row locks: booking creation locks
//! the tool row (`FOR UPDATE`) before the overlap check, so two requests for
//! the same tool are serialized; status changes and deletes lock the booking
//! row. A transaction dropped before `commit` rolls back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::{BOOKING_COLUMNS, BookingRow, TOOL_COLUMNS, ToolRow};
use super::{BookingGuard, BookingStore, StatusTally, ToolDirectory};
use crate::config::ServiceConfig;
use crate::domain::booking::OVERLAP_MESSAGE;
use crate::domain::{Booking, BookingId, BookingQuery, BookingStatus, Tool, ToolId, UserId};
use crate::error::ServiceError;

/// `WHERE` clause shared by the list and count queries.
///
/// `$1` is the user, `$2` the role name, `$3` the optional status.
const LIST_FILTER: &str = "\
    CASE $2::text \
        WHEN 'borrower' THEN borrower_id = $1 \
        WHEN 'lender' THEN lender_id = $1 \
        ELSE (borrower_id = $1 OR lender_id = $1) \
    END \
    AND ($3::text IS NULL OR status = $3)";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from `config` and optionally runs the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if the database is unreachable
    /// or a migration fails.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        if config.database_run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| ServiceError::Persistence(format!("migration failed: {e}")))?;
            tracing::info!("database migrations applied");
        }

        Ok(Self::new(pool))
    }

    /// Locks and loads a booking inside `tx`.
    async fn lock_booking(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        booking_id: BookingId,
    ) -> Result<Booking, ServiceError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(booking_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ServiceError::BookingNotFound(*booking_id.as_uuid()))?;
        Booking::try_from(row)
    }
}

/// Converts a page bound to the `BIGINT` Postgres expects.
fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ToolDirectory for PostgresStore {
    async fn get_tool(&self, tool_id: ToolId) -> Result<Tool, ServiceError> {
        let query = format!("SELECT {TOOL_COLUMNS} FROM tools WHERE id = $1");
        sqlx::query_as::<_, ToolRow>(&query)
            .bind(tool_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Tool::from)
            .ok_or(ServiceError::ToolNotFound(*tool_id.as_uuid()))
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn insert_unless_blocked(&self, booking: Booking) -> Result<Booking, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM tools WHERE id = $1 FOR UPDATE")
            .bind(booking.tool_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(ServiceError::ToolNotFound(*booking.tool_id.as_uuid()));
        }

        let conflict = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM bookings \
             WHERE tool_id = $1 AND status IN ('confirmed', 'active') \
               AND start_date < $3 AND end_date > $2 \
             LIMIT 1",
        )
        .bind(booking.tool_id.as_uuid())
        .bind(booking.start_date)
        .bind(booking.end_date)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(conflict) = conflict {
            tracing::debug!(tool_id = %booking.tool_id, %conflict, "booking window blocked");
            return Err(ServiceError::invalid(OVERLAP_MESSAGE));
        }

        let query = format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(booking.id.as_uuid())
            .bind(booking.tool_id.as_uuid())
            .bind(booking.borrower_id.as_uuid())
            .bind(booking.lender_id.as_uuid())
            .bind(booking.start_date)
            .bind(booking.end_date)
            .bind(booking.total_price)
            .bind(booking.security_deposit)
            .bind(&booking.delivery_method)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Booking::try_from(row)
    }

    async fn find(&self, booking_id: BookingId) -> Result<Option<Booking>, ServiceError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(booking_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Booking::try_from)
            .transpose()
    }

    async fn list(&self, query: &BookingQuery) -> Result<(Vec<Booking>, u64), ServiceError> {
        let status = query.status.map(BookingStatus::as_str);

        let count_sql = format!("SELECT COUNT(*) FROM bookings WHERE {LIST_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(query.user_id.as_uuid())
            .bind(query.role.as_str())
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let page_sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {LIST_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&page_sql)
            .bind(query.user_id.as_uuid())
            .bind(query.role.as_str())
            .bind(status)
            .bind(to_i64(query.limit))
            .bind(to_i64(query.offset))
            .fetch_all(&self.pool)
            .await?;

        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((bookings, u64::try_from(total).unwrap_or(0)))
    }

    async fn update_status(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
        guard: BookingGuard<'_>,
    ) -> Result<Booking, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_booking(&mut tx, booking_id).await?;
        guard(&current)?;

        let query = format!(
            "UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(booking_id.as_uuid())
            .bind(status.as_str())
            .bind(updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Booking::try_from(row)
    }

    async fn delete(
        &self,
        booking_id: BookingId,
        guard: BookingGuard<'_>,
    ) -> Result<Booking, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_booking(&mut tx, booking_id).await?;
        guard(&current)?;

        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(current)
    }

    async fn blocking_for_tool(&self, tool_id: ToolId) -> Result<Vec<Booking>, ServiceError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE tool_id = $1 AND status IN ('confirmed', 'active') \
             ORDER BY start_date, end_date"
        );
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(tool_id.as_uuid())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn lender_tallies(&self, lender: UserId) -> Result<Vec<StatusTally>, ServiceError> {
        let rows = sqlx::query_as::<_, (String, i64, Decimal)>(
            "SELECT status, COUNT(*), COALESCE(SUM(total_price), 0) \
             FROM bookings WHERE lender_id = $1 GROUP BY status",
        )
        .bind(lender.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, count, total_price)| {
                Ok(StatusTally {
                    status: status.parse().map_err(ServiceError::Persistence)?,
                    count: u64::try_from(count).unwrap_or(0),
                    total_price,
                })
            })
            .collect()
    }
}
