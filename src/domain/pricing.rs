//! Booking price computation.
//!
//! Bookings are billed per calendar day: the number of days between the
//! start date and the end date, with a floor of one billable day.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::Tool;

/// Price breakdown for a booking window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriceQuote {
    /// Number of billable days (at least 1).
    pub billable_days: i64,
    /// Daily rate applied.
    pub price_per_day: Decimal,
    /// `billable_days * price_per_day`.
    pub total_price: Decimal,
    /// Deposit that would be held for the booking.
    pub security_deposit: Decimal,
}

/// Number of billable days between `start` and `end`.
///
/// Counts calendar-date boundaries crossed (`end.date - start.date`), so a
/// same-day rental and an overnight rental both bill one day.
#[must_use]
pub fn billable_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end.date_naive() - start.date_naive()).num_days().max(1)
}

/// Computes the price of renting `tool` over `[start, end)`.
///
/// Uses the tool's current rates. The result is copied onto the booking and
/// never recomputed.
#[must_use]
pub fn quote(tool: &Tool, start: DateTime<Utc>, end: DateTime<Utc>) -> PriceQuote {
    let days = billable_days(start, end);
    PriceQuote {
        billable_days: days,
        price_per_day: tool.price_per_day,
        total_price: tool.price_per_day * Decimal::from(days),
        security_deposit: tool.security_deposit,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        let Some(ts) = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single() else {
            panic!("valid timestamp");
        };
        ts
    }

    #[test]
    fn whole_days_between_dates() {
        assert_eq!(billable_days(at(2024, 1, 10, 0), at(2024, 1, 12, 0)), 2);
        assert_eq!(billable_days(at(2024, 1, 10, 9), at(2024, 1, 17, 9)), 7);
    }

    #[test]
    fn same_day_rental_bills_one_day() {
        assert_eq!(billable_days(at(2024, 1, 10, 10), at(2024, 1, 10, 12)), 1);
    }

    #[test]
    fn counts_calendar_dates_not_elapsed_hours() {
        // 22:00 to 02:00 the next day crosses one date boundary.
        assert_eq!(billable_days(at(2024, 1, 10, 22), at(2024, 1, 11, 2)), 1);
        // 23:00 to 01:00 two days later spans 26 hours but two dates.
        assert_eq!(billable_days(at(2024, 1, 10, 23), at(2024, 1, 12, 1)), 2);
    }

    #[test]
    fn month_boundaries() {
        assert_eq!(billable_days(at(2024, 2, 28, 12), at(2024, 3, 1, 12)), 2);
    }

    #[test]
    fn quote_multiplies_daily_rate() {
        let tool = Tool::new(UserId::new(), "drill", Decimal::from(10))
            .with_deposit(Decimal::from(50));
        let q = quote(&tool, at(2024, 1, 10, 0), at(2024, 1, 12, 0));
        assert_eq!(q.billable_days, 2);
        assert_eq!(q.total_price, Decimal::from(20));
        assert_eq!(q.security_deposit, Decimal::from(50));
    }

    #[test]
    fn quote_keeps_fractional_rates() {
        let tool = Tool::new(UserId::new(), "sander", Decimal::new(1250, 2));
        let q = quote(&tool, at(2024, 1, 10, 0), at(2024, 1, 13, 0));
        assert_eq!(q.total_price, Decimal::new(3750, 2));
    }
}
