use futures_util::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::time::Duration;

/// Where the table and the auto-play driver get their pauses from.
/// Swapping it out lets tests run whole games without real timers.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Real time, via the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        if duration.is_zero() {
            tokio::task::yield_now().boxed()
        } else {
            tokio::time::sleep(duration).boxed()
        }
    }
}

/// Never waits; only yields to the scheduler and remembers what was asked for.
#[derive(Debug, Default)]
pub struct InstantClock {
    requested: Mutex<Vec<Duration>>,
}

impl InstantClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().clone()
    }
}

impl Clock for InstantClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.requested.lock().push(duration);
        tokio::task::yield_now().boxed()
    }
}
