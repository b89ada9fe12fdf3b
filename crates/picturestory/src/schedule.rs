//! Scheduled tasks driven by the frame loop.
//!
//! Both tasks are polled with the current time instead of owning a thread, so
//! cancelling one is just dropping its schedule: nothing fires after `cancel`.

use std::time::{Duration, Instant};

/// Milliseconds per frame at 60 fps, the unit continuous motion speeds are given in.
const FRAME_MS: f32 = 16.67;

/// Fires at a fixed period once started.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period. An active timer restarts from `now`.
    pub fn set_period(&mut self, period: Duration, now: Instant) {
        self.period = period.max(Duration::from_millis(1));
        if self.is_active() {
            self.start(now);
        }
    }

    /// Time left until the next firing, for scheduling a repaint.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
    }

    /// Returns true at most once per poll when the timer is due.
    /// Missed periods are not replayed: a late poll fires once and reschedules.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        let mut next = due + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next_due = Some(next);
        true
    }
}

/// Continuous motion normalized to elapsed time.
///
/// `speed` is in units per 60 fps frame, so the distance covered per second is
/// the same regardless of the actual frame rate.
#[derive(Debug, Clone)]
pub struct ContinuousMotion {
    speed: f32,
    last: Option<Instant>,
}

impl ContinuousMotion {
    pub fn new(speed: f32) -> Self {
        Self { speed, last: None }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Forget the previous timestamp; the next `advance` moves by zero.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Distance to move for the frame at `now`.
    pub fn advance(&mut self, now: Instant) -> f32 {
        let Some(last) = self.last.replace(now) else {
            return 0.0;
        };
        let dt_ms = now.saturating_duration_since(last).as_secs_f32() * 1000.0;
        self.speed * dt_ms / FRAME_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_inactive_until_started() {
        let now = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(5));
        assert!(!timer.is_active());
        assert!(!timer.poll(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_timer_fires_each_period() {
        let start = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(5));
        timer.start(start);
        assert!(!timer.poll(start + Duration::from_secs(4)));
        assert!(timer.poll(start + Duration::from_secs(5)));
        assert!(!timer.poll(start + Duration::from_secs(6)));
        assert!(timer.poll(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_late_poll_fires_once() {
        let start = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(start);
        let late = start + Duration::from_secs(10);
        assert!(timer.poll(late));
        assert!(!timer.poll(late));
        assert_eq!(timer.remaining(late), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_cancel_stops_firing() {
        let start = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(start);
        timer.cancel();
        assert!(!timer.is_active());
        assert!(!timer.poll(start + Duration::from_secs(3)));
        assert_eq!(timer.remaining(start), None);
    }

    #[test]
    fn test_set_period_restarts_active_timer() {
        let start = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(5));
        timer.start(start);
        let later = start + Duration::from_secs(4);
        timer.set_period(Duration::from_secs(2), later);
        assert!(!timer.poll(start + Duration::from_secs(5)));
        assert!(timer.poll(later + Duration::from_secs(2)));
    }

    #[test]
    fn test_set_period_keeps_inactive_timer_inactive() {
        let now = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(5));
        timer.set_period(Duration::from_secs(1), now);
        assert!(!timer.is_active());
        assert_eq!(timer.period(), Duration::from_secs(1));
    }

    #[test]
    fn test_motion_first_frame_is_zero() {
        let mut motion = ContinuousMotion::new(2.0);
        assert_eq!(motion.advance(Instant::now()), 0.0);
    }

    #[test]
    fn test_motion_is_frame_rate_independent() {
        let start = Instant::now();

        // 60 frames of ~16.67 ms
        let mut fast = ContinuousMotion::new(2.0);
        fast.advance(start);
        let mut fast_total = 0.0;
        for i in 1..=60 {
            fast_total += fast.advance(start + Duration::from_micros(16_667 * i));
        }

        // One frame of one second
        let mut slow = ContinuousMotion::new(2.0);
        slow.advance(start);
        let slow_total = slow.advance(start + Duration::from_micros(16_667 * 60));

        assert!((fast_total - slow_total).abs() < 0.01, "{fast_total} vs {slow_total}");
        assert!((slow_total - 120.0).abs() < 0.1, "got {slow_total}");
    }

    #[test]
    fn test_motion_reset() {
        let start = Instant::now();
        let mut motion = ContinuousMotion::new(1.0);
        motion.advance(start);
        motion.reset();
        assert_eq!(motion.advance(start + Duration::from_secs(1)), 0.0);
    }
}
