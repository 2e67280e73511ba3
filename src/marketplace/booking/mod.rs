//! Booking validation and session pricing.

mod engine;
mod pricing;

pub use engine::{BookingEngine, BookingError, BookingRequest};
pub use pricing::{FeeSplit, PricingPolicy};
