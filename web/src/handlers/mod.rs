//! HTTP request handlers shared by every Estate deployment.

pub mod health;

pub use health::{HealthReport, ReadinessProbe, health_check, readiness};
