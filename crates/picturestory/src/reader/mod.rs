//! The reading surface: document display, auto-scroll, immersive mode and widget hosting.

mod app;
pub mod autoscroll;
pub mod controller;
pub mod immersive;

pub use app::run;
pub use autoscroll::{AutoScroll, ReadingMode};
pub use controller::ReaderController;
pub use immersive::InactivityTimer;
