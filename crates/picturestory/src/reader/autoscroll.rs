use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::schedule::ContinuousMotion;

pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 20.0;
pub const DEFAULT_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingMode {
    #[default]
    Vertical,
    Horizontal,
    /// Horizontal pages one viewport wide.
    Book,
}

impl ReadingMode {
    pub const ALL: [ReadingMode; 3] = [Self::Vertical, Self::Horizontal, Self::Book];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            "book" => Some(Self::Book),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vertical => "Vertical scroll",
            Self::Horizontal => "Horizontal scroll",
            Self::Book => "Book",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        !matches!(self, Self::Vertical)
    }
}

/// Hands-free scrolling along the reading axis.
#[derive(Debug, Clone)]
pub struct AutoScroll {
    motion: ContinuousMotion,
    position: f32,
    playing: bool,
}

impl AutoScroll {
    pub fn new(speed: f32) -> Self {
        Self {
            motion: ContinuousMotion::new(speed.clamp(MIN_SPEED, MAX_SPEED)),
            position: 0.0,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f32 {
        self.motion.speed()
    }

    /// Begin scrolling from the current scroll offset.
    pub fn start(&mut self, offset: f32) {
        self.position = offset;
        self.motion.reset();
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.motion.set_speed(speed.clamp(MIN_SPEED, MAX_SPEED));
    }

    /// Next scroll offset for the frame at `now`, or `None` when stopped.
    ///
    /// `content` and `viewport` are extents along the scroll axis. Reaching the
    /// end loops back to the start. Book mode never moves past the next page
    /// boundary within a single step.
    pub fn step(
        &mut self,
        mode: ReadingMode,
        now: Instant,
        content: f32,
        viewport: f32,
    ) -> Option<f32> {
        if !self.playing {
            return None;
        }

        let increment = self.motion.advance(now);
        match mode {
            ReadingMode::Vertical | ReadingMode::Horizontal => {
                self.position += increment;
            }
            ReadingMode::Book => {
                let page = viewport.max(1.0);
                let current_page = (self.position / page).floor();
                let target = (current_page + 1.0) * page;
                self.position += increment.min(target - self.position);
            }
        }

        if self.position >= content - viewport {
            self.position = 0.0;
        }
        Some(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FRAME: Duration = Duration::from_micros(16_670);

    #[test]
    fn test_stopped_does_not_move() {
        let mut scroll = AutoScroll::new(2.0);
        assert_eq!(scroll.step(ReadingMode::Vertical, Instant::now(), 1000.0, 100.0), None);
    }

    #[test]
    fn test_vertical_advances_by_speed_per_frame() {
        let start = Instant::now();
        let mut scroll = AutoScroll::new(3.0);
        scroll.start(10.0);
        assert_eq!(scroll.step(ReadingMode::Vertical, start, 1000.0, 100.0), Some(10.0));
        let next = scroll
            .step(ReadingMode::Vertical, start + FRAME, 1000.0, 100.0)
            .unwrap();
        assert!((next - 13.0).abs() < 0.01, "got {next}");
    }

    #[test]
    fn test_loops_back_at_end() {
        let start = Instant::now();
        let mut scroll = AutoScroll::new(20.0);
        scroll.start(890.0);
        scroll.step(ReadingMode::Horizontal, start, 1000.0, 100.0);
        let next = scroll.step(ReadingMode::Horizontal, start + FRAME, 1000.0, 100.0);
        assert_eq!(next, Some(0.0));
    }

    #[test]
    fn test_short_content_stays_at_top() {
        let start = Instant::now();
        let mut scroll = AutoScroll::new(2.0);
        scroll.start(0.0);
        assert_eq!(scroll.step(ReadingMode::Vertical, start, 50.0, 100.0), Some(0.0));
    }

    #[test]
    fn test_book_mode_stops_at_page_boundary() {
        let start = Instant::now();
        let mut scroll = AutoScroll::new(20.0);
        scroll.start(395.0);
        scroll.step(ReadingMode::Book, start, 4000.0, 400.0);
        // A full second would move 1200, but the page boundary is at 400.
        let next = scroll
            .step(ReadingMode::Book, start + Duration::from_secs(1), 4000.0, 400.0)
            .unwrap();
        assert_eq!(next, 400.0);
    }

    #[test]
    fn test_speed_clamped() {
        let mut scroll = AutoScroll::new(100.0);
        assert_eq!(scroll.speed(), MAX_SPEED);
        scroll.set_speed(0.0);
        assert_eq!(scroll.speed(), MIN_SPEED);
    }

    #[test]
    fn test_reading_mode_names() {
        assert_eq!(ReadingMode::from_name("book"), Some(ReadingMode::Book));
        assert_eq!(ReadingMode::from_name("diagonal"), None);
        assert!(ReadingMode::Book.is_horizontal());
        assert!(!ReadingMode::Vertical.is_horizontal());
    }
}
