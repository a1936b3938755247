//! # API Shared
//!
//! Wire types shared by the IPS API server and its clients.
//!
//! Contains:
//! - Liveness/readiness bodies and the `HealthService` that builds them
//! - The `{"detail": ...}` error body every failed request returns

pub mod error;
pub mod health;

pub use error::ErrorBody;
pub use health::{HealthRes, HealthService};
