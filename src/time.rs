//! Time abstraction for testability.
//!
//! The dispatcher stamps every audit record through a [`Clock`], so tests
//! can inject fixed timestamps instead of relying on wall-clock time.

use chrono::{DateTime, Utc};

/// Abstraction over the current time.
///
/// # Example
///
/// ```
/// use alert_webhooks::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now.timestamp() > 0);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock using actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that returns a settable instant, in whole seconds since the epoch.
    #[derive(Debug)]
    pub struct MockClock {
        secs: AtomicI64,
    }

    impl MockClock {
        pub const fn new(initial_secs: i64) -> Self {
            Self {
                secs: AtomicI64::new(initial_secs),
            }
        }

        pub fn advance(&self, secs: i64) {
            self.secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0)
                .unwrap_or(DateTime::UNIX_EPOCH)
        }
    }
}
