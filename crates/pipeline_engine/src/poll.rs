//! Fixed-interval poll timer driven by an injectable [`Clock`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use pipeline_logging::pipeline_debug;

use crate::{Clock, SystemClock};

/// Default interval between background queue polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct PollScheduler {
    interval: Duration,
    clock: Arc<dyn Clock>,
    next_due: Option<Instant>,
}

impl PollScheduler {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            next_due: None,
        }
    }

    pub fn with_system_clock(interval: Duration) -> Self {
        Self::new(interval, Arc::new(SystemClock))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms the timer; the first poll falls due one interval from now.
    /// Restarting a running scheduler pushes the deadline back.
    pub fn start(&mut self) {
        self.next_due = Some(self.clock.now() + self.interval);
        pipeline_debug!("Poll scheduler started ({:?})", self.interval);
    }

    pub fn stop(&mut self) {
        if self.next_due.take().is_some() {
            pipeline_debug!("Poll scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true once per elapsed interval and re-arms for the next one.
    pub fn poll_due(&mut self) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        let now = self.clock.now();
        if now < due {
            return false;
        }
        self.next_due = Some(now + self.interval);
        true
    }

    /// Time left before the next poll, `None` while stopped.
    pub fn time_until_due(&self) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(self.clock.now()))
    }
}
