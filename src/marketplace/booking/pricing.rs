use serde::{Deserialize, Serialize};

use crate::marketplace::money::Money;
use crate::marketplace::session::SessionDuration;

const DEFAULT_PLATFORM_FEE_BASIS_POINTS: u32 = 400;

/// Marketplace commission dial. Defaults to the 4% platform fee; operators can
/// override it through `AppConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub platform_fee_basis_points: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            platform_fee_basis_points: DEFAULT_PLATFORM_FEE_BASIS_POINTS,
        }
    }
}

/// How a session's total splits between the marketplace and the tutor.
/// Invariant: `platform_fee + tutor_earnings` recomposes the amount exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub platform_fee: Money,
    pub tutor_earnings: Money,
}

impl PricingPolicy {
    pub fn new(platform_fee_basis_points: u32) -> Self {
        PricingPolicy {
            platform_fee_basis_points,
        }
    }

    /// Total price: hourly rate scaled by the booked fraction of an hour.
    /// Exact in cents for every bookable duration.
    pub fn session_total(&self, hourly_rate: Money, duration: SessionDuration) -> Money {
        hourly_rate.mul_ratio(duration.minutes() as i64, 60)
    }

    /// Fee is rounded once; earnings come from subtraction so the two halves
    /// always add back to the amount.
    pub fn fee_split(&self, amount: Money) -> FeeSplit {
        let platform_fee = amount.mul_ratio(self.platform_fee_basis_points as i64, 10_000);
        FeeSplit {
            platform_fee,
            tutor_earnings: amount - platform_fee,
        }
    }
}
