//! Wall-clock access, swappable for tests.
//!
//! Transaction expiration is "now + horizon", so anything that builds
//! transactions takes a [`Clock`] instead of reading the system time.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;

use crate::types::TimePointSec;

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimePointSec;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePointSec {
        TimePointSec::from_datetime(Utc::now())
    }
}

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
#[derive(Debug, Default)]
pub struct FixedClock {
    current: AtomicU32,
}

impl FixedClock {
    pub fn new(at: TimePointSec) -> Self {
        Self {
            current: AtomicU32::new(at.unix()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now().saturating_add(by);
        self.current.store(next.unix(), Ordering::SeqCst);
    }

    pub fn set(&self, at: TimePointSec) {
        self.current.store(at.unix(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> TimePointSec {
        TimePointSec(self.current.load(Ordering::SeqCst))
    }
}
