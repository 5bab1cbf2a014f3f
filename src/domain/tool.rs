//! Tool listing as seen by the booking engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ToolId, UserId};

/// A listed tool: ownership, availability and pricing.
///
/// The booking engine only ever reads tools. Availability toggling and
/// listing edits belong to the tool catalogue, which lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tool {
    /// Unique tool identifier.
    pub id: ToolId,

    /// The user who lists the tool; becomes the lender of every booking.
    pub owner_id: UserId,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Whether the owner currently accepts booking requests.
    pub is_available: bool,

    /// Optional hourly rate. Informational; bookings are billed per day.
    #[serde(default)]
    pub price_per_hour: Option<Decimal>,

    /// Daily rate used for booking price computation.
    pub price_per_day: Decimal,

    /// Optional weekly rate. Informational; bookings are billed per day.
    #[serde(default)]
    pub price_per_week: Option<Decimal>,

    /// Deposit copied onto each booking at creation time.
    #[serde(default)]
    pub security_deposit: Decimal,
}

impl Tool {
    /// Creates an available tool with a daily rate and no deposit.
    #[must_use]
    pub fn new(owner_id: UserId, name: impl Into<String>, price_per_day: Decimal) -> Self {
        Self {
            id: ToolId::new(),
            owner_id,
            name: name.into(),
            is_available: true,
            price_per_hour: None,
            price_per_day,
            price_per_week: None,
            security_deposit: Decimal::ZERO,
        }
    }

    /// Sets the security deposit.
    #[must_use]
    pub fn with_deposit(mut self, deposit: Decimal) -> Self {
        self.security_deposit = deposit;
        self
    }

    /// Checks that every rate and the deposit are non-negative.
    ///
    /// # Errors
    ///
    /// Returns the name of the first offending field.
    pub fn check_pricing(&self) -> Result<(), String> {
        let rates = [
            ("price_per_day", Some(self.price_per_day)),
            ("security_deposit", Some(self.security_deposit)),
            ("price_per_hour", self.price_per_hour),
            ("price_per_week", self.price_per_week),
        ];
        for (field, value) in rates {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                return Err(format!("{field} must not be negative"));
            }
        }
        Ok(())
    }

    /// Returns `true` if `user` owns this tool.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn negative_rates_fail_pricing_check() {
        let base = Tool::new(UserId::new(), "drill", Decimal::from(10));
        assert!(base.check_pricing().is_ok());

        let mut daily = base.clone();
        daily.price_per_day = Decimal::from(-10);
        assert_eq!(
            daily.check_pricing(),
            Err("price_per_day must not be negative".to_string())
        );

        let deposit = base.clone().with_deposit(Decimal::from(-1));
        assert_eq!(
            deposit.check_pricing(),
            Err("security_deposit must not be negative".to_string())
        );

        let mut weekly = base;
        weekly.price_per_week = Some(Decimal::from(-70));
        assert!(weekly.check_pricing().is_err());
    }

    #[test]
    fn new_tool_is_available() {
        let owner = UserId::new();
        let tool = Tool::new(owner, "drill", Decimal::from(10));
        assert!(tool.is_available);
        assert!(tool.is_owned_by(owner));
        assert!(!tool.is_owned_by(UserId::new()));
        assert_eq!(tool.security_deposit, Decimal::ZERO);
    }

    #[test]
    fn deserializes_catalog_entry_with_defaults() {
        let json = r#"{
            "id": "6f1c1f0e-3d7a-4b8e-9a51-2f4c2f6b0d11",
            "owner_id": "0b8f7a62-5b1e-4c7b-8f0e-6c3d9a2e4f55",
            "is_available": true,
            "price_per_day": "12.50"
        }"#;
        let Ok(tool) = serde_json::from_str::<Tool>(json) else {
            panic!("catalog entry should deserialize");
        };
        assert_eq!(tool.price_per_day, Decimal::new(1250, 2));
        assert_eq!(tool.price_per_week, None);
        assert!(tool.name.is_empty());
    }
}
