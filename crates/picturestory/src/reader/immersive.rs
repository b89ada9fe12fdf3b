use std::time::{Duration, Instant};

pub const DEFAULT_INACTIVITY_DELAY: Duration = Duration::from_secs(3);

/// Hides the reader chrome after a period without user activity.
///
/// Only runs while a document is loaded. Both methods return `Some(state)` when
/// the immersive state flips, so the caller can tell the widgets.
#[derive(Debug, Clone)]
pub struct InactivityTimer {
    delay: Duration,
    deadline: Option<Instant>,
    immersive: bool,
}

impl InactivityTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            immersive: false,
        }
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// User activity: show the chrome and restart the countdown.
    pub fn activity(&mut self, now: Instant, document_loaded: bool) -> Option<bool> {
        self.deadline = document_loaded.then(|| now + self.delay);
        if self.immersive {
            self.immersive = false;
            Some(false)
        } else {
            None
        }
    }

    pub fn poll(&mut self, now: Instant, document_loaded: bool) -> Option<bool> {
        if self.immersive || !document_loaded {
            return None;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.immersive = true;
                Some(true)
            }
            _ => None,
        }
    }

    /// Time until the chrome hides, for scheduling a repaint.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hides_after_delay() {
        let start = Instant::now();
        let mut timer = InactivityTimer::new(DEFAULT_INACTIVITY_DELAY);
        assert_eq!(timer.activity(start, true), None);
        assert_eq!(timer.poll(start + Duration::from_secs(2), true), None);
        assert_eq!(timer.poll(start + Duration::from_secs(3), true), Some(true));
        assert!(timer.is_immersive());
        // Already immersive: no repeated notifications.
        assert_eq!(timer.poll(start + Duration::from_secs(9), true), None);
    }

    #[test]
    fn test_activity_shows_and_restarts() {
        let start = Instant::now();
        let mut timer = InactivityTimer::new(Duration::from_secs(3));
        timer.activity(start, true);
        timer.poll(start + Duration::from_secs(3), true);

        let moved = start + Duration::from_secs(5);
        assert_eq!(timer.activity(moved, true), Some(false));
        assert!(!timer.is_immersive());
        assert_eq!(timer.poll(moved + Duration::from_secs(2), true), None);
        assert_eq!(timer.poll(moved + Duration::from_secs(3), true), Some(true));
    }

    #[test]
    fn test_no_document_never_hides() {
        let start = Instant::now();
        let mut timer = InactivityTimer::new(Duration::from_secs(3));
        timer.activity(start, false);
        assert_eq!(timer.poll(start + Duration::from_secs(60), false), None);
        assert_eq!(timer.remaining(start), None);
    }

    #[test]
    fn test_activity_pushes_deadline() {
        let start = Instant::now();
        let mut timer = InactivityTimer::new(Duration::from_secs(3));
        timer.activity(start, true);
        timer.activity(start + Duration::from_secs(2), true);
        assert_eq!(timer.poll(start + Duration::from_secs(4), true), None);
        assert_eq!(
            timer.remaining(start + Duration::from_secs(4)),
            Some(Duration::from_secs(1))
        );
    }
}
