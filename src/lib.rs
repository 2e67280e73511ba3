//! Apollo marketplace service library: domain core plus the configuration,
//! telemetry, and error plumbing the binary wires together.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
