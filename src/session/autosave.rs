//! The autosave timer.
//!
//! A deadline the session polls once per tick. The timer is repeating: after
//! a fire it re-arms relative to the fire time, so a long stall produces one
//! catch-up save rather than a burst. Dropping the session drops the timer;
//! there is no global scheduler state to leak.

use std::time::{Duration, Instant};

pub struct AutosaveTimer {
    interval: Duration,
    deadline: Instant,
}

impl AutosaveTimer {
    /// Arms the timer: the first fire comes one full interval after `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            deadline: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True exactly when the deadline has passed; re-arms on fire.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.deadline {
            return false;
        }
        self.deadline = now + self.interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_fire_before_the_interval() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_secs(5), start);
        assert!(!timer.poll(start));
        assert!(!timer.poll(start + Duration::from_secs(4)));
    }

    #[test]
    fn fires_at_or_after_the_interval_and_re_arms() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_secs(5), start);

        assert!(timer.poll(start + Duration::from_secs(5)));
        // Re-armed: quiet again until another full interval elapses.
        assert!(!timer.poll(start + Duration::from_secs(6)));
        assert!(timer.poll(start + Duration::from_secs(10)));
    }

    #[test]
    fn a_stall_yields_one_catch_up_fire_not_a_burst() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_secs(5), start);

        let late = start + Duration::from_secs(60);
        assert!(timer.poll(late));
        assert!(!timer.poll(late + Duration::from_secs(1)));
        assert!(timer.poll(late + Duration::from_secs(5)));
    }
}
