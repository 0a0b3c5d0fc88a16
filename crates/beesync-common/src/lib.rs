//! beesync-common: Shared types, errors, and form validation used across all BeeSync crates.

pub mod error;
pub mod entities;
pub mod validation;

// Re-export commonly used types
pub use error::{ApiError, BeesyncError, Result};
pub use entities::{Hive, SynchronizedReading, ThreatAlert, PotentialLocation, PerformancePrediction};
