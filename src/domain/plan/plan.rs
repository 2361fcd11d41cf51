//! Plan catalog entry.
//!
//! A plan is immutable once created. Price changes are modelled as a new
//! plan id; the old plan is deactivated so it drops out of the public
//! listing while existing subscriptions keep resolving it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Timestamp, ValidationError};

use super::BillingPeriod;

/// Largest accepted price. One year of the most frequent cadence must still
/// fit in an `i64`.
pub const MAX_PRICE_MINOR_UNITS: i64 = i64::MAX / 12;

/// A purchasable plan version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Price in the currency's minor unit (paise, cents).
    pub price_minor_units: i64,
    /// ISO 4217 code, upper case.
    pub currency: String,
    pub billing_period: BillingPeriod,
    pub features: Vec<String>,
    /// Inactive plans are hidden from `list(active_only = true)`.
    pub active: bool,
    pub created_at: Timestamp,
}

impl Plan {
    /// Creates a new active plan after validating its fields.
    ///
    /// # Errors
    ///
    /// - blank name
    /// - negative price, or one above [`MAX_PRICE_MINOR_UNITS`]
    /// - currency that is not a three-letter code
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        price_minor_units: i64,
        currency: impl Into<String>,
        billing_period: BillingPeriod,
        features: Vec<String>,
        created_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if !(0..=MAX_PRICE_MINOR_UNITS).contains(&price_minor_units) {
            return Err(ValidationError::out_of_range(
                "price_minor_units",
                0,
                MAX_PRICE_MINOR_UNITS,
                price_minor_units,
            ));
        }
        let currency = normalize_currency(&currency.into())?;
        let features = features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        Ok(Self {
            id,
            name,
            price_minor_units,
            currency,
            billing_period,
            features,
            active: true,
            created_at,
        })
    }

    /// Price of one year of this plan, in minor units.
    ///
    /// Saturates for rows that bypassed [`Plan::new`].
    pub fn yearly_price_minor_units(&self) -> i64 {
        self.price_minor_units
            .saturating_mul(self.billing_period.periods_per_year())
    }
}

/// Validates and upper-cases an ISO 4217 currency code.
pub fn normalize_currency(code: &str) -> Result<String, ValidationError> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::invalid_format(
            "currency",
            "expected a three-letter ISO 4217 code",
        ));
    }
    Ok(code)
}
