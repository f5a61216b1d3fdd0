use std::sync::Arc;

use time::OffsetDateTime;

/// Source of the current time. The sequence year and every lifecycle
/// timestamp are read through it.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn current_year(&self) -> i32 {
        self.now().year()
    }
}

pub type ClockRef = Arc<dyn Clock>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
