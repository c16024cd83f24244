//! # Timer Module - Single-Shot Deadlines
//!
//! The engine has exactly two asynchronous elements: the error-flash expiry and the
//! debounced save. Both are a single pending callback that is *replaced*, never queued, by
//! each new event. Here that is a stored deadline the host drives by polling with the
//! current time.
//!
//! Every deadline is stamped with the [`Generation`] of the lesson that scheduled it. A
//! deadline from an earlier lesson is discarded without firing.

use web_time::Instant;

/// Identifies one lesson load. Bumped on every lesson switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    generation: Generation,
    due: Instant,
}

/// A cancellable, replaceable single-shot deadline
#[derive(Debug, Clone, Default)]
pub struct Timer {
    scheduled: Option<Scheduled>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the deadline, replacing any pending one
    pub fn schedule(&mut self, generation: Generation, due: Instant) {
        self.scheduled = Some(Scheduled { generation, due });
    }

    pub fn cancel(&mut self) {
        self.scheduled = None;
    }

    pub fn is_pending(&self) -> bool {
        self.scheduled.is_some()
    }

    pub fn due(&self) -> Option<Instant> {
        self.scheduled.map(|scheduled| scheduled.due)
    }

    /// Fire the deadline if it is due
    ///
    /// Returns `true` exactly once per scheduled deadline. A deadline scheduled under a
    /// different generation is dropped and reported as not fired.
    pub fn fire(&mut self, now: Instant, current: Generation) -> bool {
        let Some(scheduled) = self.scheduled else {
            return false;
        };

        if scheduled.generation != current {
            tracing::trace!("dropping stale timer");
            self.scheduled = None;
            return false;
        }

        if now < scheduled.due {
            return false;
        }

        self.scheduled = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;

    #[test]
    fn test_timer_fires_once() {
        let now = Instant::now();
        let generation = Generation::default();
        let mut timer = Timer::new();

        assert!(!timer.fire(now, generation));

        timer.schedule(generation, now + Duration::from_millis(400));
        assert!(timer.is_pending());
        assert!(!timer.fire(now + Duration::from_millis(399), generation));
        assert!(timer.fire(now + Duration::from_millis(400), generation));
        assert!(!timer.fire(now + Duration::from_millis(800), generation));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_timer_is_replaced_not_queued() {
        let now = Instant::now();
        let generation = Generation::default();
        let mut timer = Timer::new();

        timer.schedule(generation, now + Duration::from_millis(100));
        timer.schedule(generation, now + Duration::from_millis(500));
        assert_eq!(timer.due(), Some(now + Duration::from_millis(500)));

        assert!(!timer.fire(now + Duration::from_millis(200), generation));
        assert!(timer.fire(now + Duration::from_millis(500), generation));
        assert!(!timer.fire(now + Duration::from_millis(600), generation));
    }

    #[test]
    fn test_stale_timer_is_a_no_op() {
        let now = Instant::now();
        let old = Generation::default();
        let mut timer = Timer::new();

        timer.schedule(old, now);
        assert!(!timer.fire(now + Duration::from_secs(1), old.next()));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_cancel() {
        let now = Instant::now();
        let generation = Generation::default();
        let mut timer = Timer::new();

        timer.schedule(generation, now);
        timer.cancel();
        assert!(!timer.fire(now, generation));
    }
}
