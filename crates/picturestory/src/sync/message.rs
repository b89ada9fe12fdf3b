use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::widget::{WidgetKind, WidgetSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget-{}", self.0)
    }
}

/// The reading position, as sent to every widget after each estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub line_number: usize,
    pub document_path: Option<PathBuf>,
}

/// First message a widget receives; seeds its state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitPayload {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub settings: WidgetSettings,
}

/// Reader to widget.
#[derive(Debug, Clone)]
pub enum WidgetMessage {
    Init(InitPayload),
    Position(PositionUpdate),
    Immersive(bool),
    /// The document's image script changed on disk.
    ScriptChanged,
}

/// Widget to reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMessage {
    /// The user interacted with a widget window.
    Activity(WidgetId),
}
