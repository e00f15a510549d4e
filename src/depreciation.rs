//! Asset valuation engine.
//!
//! Pure computation of net book value and accumulated depreciation from an
//! asset's cost basis and schedule parameters. Invoked by the asset service
//! on every create/update before persistence; never touches storage.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Gregorian-average year length used to convert days in service to
/// fractional years. Deliberately not calendar-exact.
const DAYS_PER_YEAR: Decimal = dec!(365.25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepreciationMethod {
    StraightLine,
    DecliningBalance,
}

impl Default for DepreciationMethod {
    fn default() -> Self {
        Self::StraightLine
    }
}

impl DepreciationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StraightLine => "STRAIGHT_LINE",
            Self::DecliningBalance => "DECLINING_BALANCE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STRAIGHT_LINE" => Some(Self::StraightLine),
            "DECLINING_BALANCE" => Some(Self::DecliningBalance),
            _ => None,
        }
    }
}

/// Result of a valuation run, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    pub net_book_value: Decimal,
    pub accumulated_depreciation: Decimal,
}

/// Computes current net book value and accumulated depreciation as of
/// `as_of`.
///
/// Straight-line spreads the cost evenly over the economic life using
/// fractional years. Declining-balance applies the 200% convention one
/// whole year at a time; the partial final year is ignored, which is a
/// known approximation carried over from the reference behavior.
///
/// An asset whose purchase date is on or after `as_of` has seen no use on
/// this clock: full price, zero depreciation.
pub fn depreciate(
    purchase_price: Decimal,
    economic_life: i32,
    date_of_purchase: NaiveDate,
    method: DepreciationMethod,
    as_of: NaiveDate,
) -> Result<Valuation, ServiceError> {
    if economic_life <= 0 {
        return Err(ServiceError::InvalidSchedule(format!(
            "economic_life must be positive, got {}",
            economic_life
        )));
    }

    let days_in_use = (as_of - date_of_purchase).num_days();
    let years_in_use = Decimal::from(days_in_use) / DAYS_PER_YEAR;

    if years_in_use <= Decimal::ZERO {
        return Ok(Valuation {
            net_book_value: purchase_price.round_dp(2),
            accumulated_depreciation: Decimal::ZERO,
        });
    }

    let life = Decimal::from(economic_life);
    let (net_book_value, accumulated) = match method {
        DepreciationMethod::StraightLine => {
            let annual = purchase_price / life;
            let net = (purchase_price - years_in_use * annual).max(Decimal::ZERO);
            let accumulated = (annual * years_in_use).min(purchase_price);
            (net, accumulated)
        }
        DepreciationMethod::DecliningBalance => {
            let rate = dec!(2) / life;
            let mut net = purchase_price;
            let mut accumulated = Decimal::ZERO;
            let whole_years = years_in_use.trunc().to_i64().unwrap_or(0);
            for _ in 0..whole_years {
                let depreciation = net * rate;
                accumulated += depreciation;
                net -= depreciation;
            }
            (net.max(Decimal::ZERO), accumulated)
        }
    };

    Ok(Valuation {
        net_book_value: net_book_value.round_dp(2),
        accumulated_depreciation: accumulated.round_dp(2),
    })
}

/// Default useful life in years for a major category. Fixed configuration,
/// not a database lookup; unlisted categories fall back to 5 years.
pub fn useful_life(category_name: &str) -> i32 {
    match category_name {
        "Furniture" => 8,
        "ICT" => 3,
        _ => 5,
    }
}
