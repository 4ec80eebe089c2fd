//! Injected dependencies shared by the services.
//!
//! Time is the only ambient input the domain reads; it is abstracted behind
//! [`Clock`] so lifecycle rules (cancellation lead time, review edit window,
//! completion of past stays) are deterministic under test.

use chrono::{DateTime, NaiveDate, Utc};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use estate_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// assert!(clock.today() <= clock.now().date_naive());
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in UTC
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
