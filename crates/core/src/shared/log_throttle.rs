use std::time::{Duration, Instant};

/// Rate limiter for diagnostics that would otherwise log every frame.
///
/// The first call always passes; later calls pass once `interval` has
/// elapsed since the last one that did.
pub struct LogThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn should_log(&mut self) -> bool {
        self.should_log_at(Instant::now())
    }

    pub fn should_log_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
