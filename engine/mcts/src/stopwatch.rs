//! Wall-clock deadline for timed searches.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    deadline: Instant,
}

impl Stopwatch {
    /// Start a stopwatch that times out after `budget`.
    pub fn start(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + budget,
        }
    }

    /// Move the deadline relative to the original start.
    pub fn set_budget(&mut self, budget: Duration) {
        self.deadline = self.started + budget;
    }

    #[inline]
    pub fn timed_out(&self) -> bool {
        Instant::now() > self.deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_times_out() {
        let watch = Stopwatch::start(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));
        assert!(watch.timed_out());
    }

    #[test]
    fn test_long_budget_does_not_time_out() {
        let mut watch = Stopwatch::start(Duration::from_secs(60));
        assert!(!watch.timed_out());

        watch.set_budget(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));
        assert!(watch.timed_out());
        assert!(watch.elapsed() >= Duration::from_millis(1));
    }
}
