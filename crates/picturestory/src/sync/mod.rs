//! Reading position tracking and its propagation to media widgets.

pub mod dispatcher;
pub mod estimator;
pub mod message;
pub mod script;

use std::path::PathBuf;

pub use dispatcher::{Dispatcher, WidgetChannels, WidgetRef, WidgetRegistry};
pub use estimator::Span;
pub use message::{InitPayload, PositionUpdate, ReaderMessage, WidgetId, WidgetMessage};
pub use script::{ImageScript, ScriptEntry};

/// Where the reader currently is. Only scroll handling writes `current_line_number`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderState {
    pub current_line_number: usize,
    pub document_path: Option<PathBuf>,
}

impl ReaderState {
    pub fn position(&self) -> PositionUpdate {
        PositionUpdate {
            line_number: self.current_line_number,
            document_path: self.document_path.clone(),
        }
    }
}
