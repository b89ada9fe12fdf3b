use anyhow::{Context, Result};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::schedule::IntervalTimer;
use crate::sync::script::{self, ScriptEntry};
use crate::sync::{PositionUpdate, WidgetId, WidgetMessage};

pub const NO_SCRIPT: &str = "No image script file found for the current document.";
pub const NO_SCRIPT_ENTRIES: &str = "No valid entries found in the image script file.";

const DEFAULT_INTERVAL_SECS: u64 = 5;
const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 10.0;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// One image, never changed automatically.
    #[default]
    Single,
    /// Chosen images, stepped in order on a timer.
    List,
    /// Every image of a folder, stepped randomly on a timer.
    Folder,
    /// Image chosen by the reading position through the document's image script.
    Script,
}

impl ImageMode {
    pub const ALL: [ImageMode; 4] = [Self::Single, Self::List, Self::Folder, Self::Script];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Single => "Single image",
            Self::List => "Image list",
            Self::Folder => "Folder (random)",
            Self::Script => "Script",
        }
    }

    fn is_timed(&self) -> bool {
        matches!(self, Self::List | Self::Folder)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    #[serde(default)]
    pub mode: ImageMode,

    /// Slideshow interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<PathBuf>,

    #[serde(default)]
    pub current_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script_entries: Vec<ScriptEntry>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            mode: ImageMode::default(),
            interval: DEFAULT_INTERVAL_SECS,
            sources: Vec::new(),
            current_index: 0,
            document_path: None,
            script_entries: Vec::new(),
        }
    }
}

/// Zoom level and pan offset of the displayed image.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomPan {
    pub level: f32,
    pub offset: [f32; 2],
    panning: bool,
}

impl Default for ZoomPan {
    fn default() -> Self {
        Self {
            level: 1.0,
            offset: [0.0, 0.0],
            panning: false,
        }
    }
}

impl ZoomPan {
    pub fn zoom_by(&mut self, delta: f32) {
        self.level = (self.level + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Panning only starts on a zoomed-in image.
    pub fn begin_pan(&mut self) -> bool {
        self.panning = self.level > 1.0;
        self.panning
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if self.panning {
            self.offset[0] += dx;
            self.offset[1] += dy;
        }
    }

    pub fn end_pan(&mut self) {
        self.panning = false;
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }
}

/// State of an image widget window.
#[derive(Debug)]
pub struct ImageWidget {
    id: WidgetId,
    mode: ImageMode,
    sources: Vec<PathBuf>,
    current_index: usize,
    document_path: Option<PathBuf>,
    script_entries: Vec<ScriptEntry>,
    displayed: Option<PathBuf>,
    /// Last reading position received, used to re-resolve after a reload.
    last_line: Option<usize>,
    timer: IntervalTimer,
    immersive: bool,
    notice: Option<String>,
    pub zoom: ZoomPan,
}

impl ImageWidget {
    pub fn new(id: WidgetId, settings: ImageSettings, now: Instant) -> Self {
        let mut widget = Self {
            id,
            mode: settings.mode,
            sources: settings.sources,
            current_index: 0,
            document_path: settings.document_path,
            script_entries: settings.script_entries,
            displayed: None,
            last_line: None,
            timer: IntervalTimer::new(Duration::from_secs(settings.interval.max(1))),
            immersive: false,
            notice: None,
            zoom: ZoomPan::default(),
        };

        if !widget.sources.is_empty() {
            widget.current_index = settings.current_index.min(widget.sources.len() - 1);
            widget.show(widget.sources[widget.current_index].clone());
            widget.start_playback(now);
        }
        widget
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    pub fn displayed(&self) -> Option<&Path> {
        self.displayed.as_deref()
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn script_entries(&self) -> &[ScriptEntry] {
        &self.script_entries
    }

    pub fn document_path(&self) -> Option<&Path> {
        self.document_path.as_deref()
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_active()
    }

    pub fn interval_secs(&self) -> u64 {
        self.timer.period().as_secs()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn handle(&mut self, message: WidgetMessage, now: Instant) {
        match message {
            // Init is consumed by the hosting window, which builds the widget from it.
            WidgetMessage::Init(_) => {}
            WidgetMessage::Position(update) => {
                self.on_position(&update);
            }
            WidgetMessage::Immersive(immersive) => self.immersive = immersive,
            WidgetMessage::ScriptChanged => {
                if self.mode == ImageMode::Script {
                    self.load_script(now);
                }
            }
        }
    }

    /// Apply a reading position. Returns whether the displayed image changed.
    pub fn on_position(&mut self, update: &PositionUpdate) -> bool {
        if let Some(path) = &update.document_path {
            self.document_path = Some(path.clone());
        }
        self.last_line = Some(update.line_number);

        match self.mode {
            ImageMode::Script => self.follow_script(update.line_number),
            ImageMode::Single | ImageMode::List | ImageMode::Folder => false,
        }
    }

    fn follow_script(&mut self, line: usize) -> bool {
        match script::resolve(&self.script_entries, line) {
            Some(entry) => {
                let path = entry.image_path.clone();
                self.show(path)
            }
            // No match keeps whatever is on screen.
            None => false,
        }
    }

    /// Switch mode. Any running slideshow stops; timed modes restart it.
    pub fn set_mode(&mut self, mode: ImageMode, now: Instant) {
        self.stop_playback();
        self.mode = mode;
        self.notice = None;
        self.start_playback(now);
    }

    /// Replace the image sources and show the first one.
    pub fn set_sources(&mut self, sources: Vec<PathBuf>, now: Instant) {
        if sources.is_empty() {
            return;
        }
        self.stop_playback();
        self.sources = sources;
        self.current_index = 0;
        self.show(self.sources[0].clone());
        self.start_playback(now);
    }

    /// Parse the current document's image script into this widget.
    /// Shows the entry for the last known line, else the first entry.
    /// On failure a notice is set and the previous entries are kept.
    pub fn load_script(&mut self, now: Instant) -> bool {
        let parsed = self
            .document_path
            .as_deref()
            .and_then(script::parse_for_document);

        match parsed {
            None => {
                self.notice = Some(NO_SCRIPT.to_string());
                false
            }
            Some(script) if script.entries.is_empty() => {
                self.notice = Some(NO_SCRIPT_ENTRIES.to_string());
                false
            }
            Some(script) => {
                let current = self
                    .last_line
                    .and_then(|line| script::resolve(&script.entries, line))
                    .unwrap_or(&script.entries[0])
                    .image_path
                    .clone();
                self.script_entries = script.entries;
                self.notice = None;
                self.set_sources(vec![current], now);
                true
            }
        }
    }

    pub fn start_playback(&mut self, now: Instant) {
        if !self.mode.is_timed() || self.sources.len() <= 1 {
            return;
        }
        self.timer.start(now);
    }

    pub fn stop_playback(&mut self) {
        self.timer.cancel();
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        if self.is_playing() {
            self.stop_playback();
        } else {
            self.start_playback(now);
        }
    }

    pub fn set_interval(&mut self, secs: u64, now: Instant) {
        self.timer
            .set_period(Duration::from_secs(secs.max(1)), now);
    }

    /// Time until the slideshow next advances, if it is running.
    pub fn next_advance_in(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }

    /// Advance the slideshow if its timer is due. Returns whether the image changed.
    pub fn tick(&mut self, now: Instant, rng: &mut impl Rng) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.advance(rng)
    }

    fn advance(&mut self, rng: &mut impl Rng) -> bool {
        let len = self.sources.len();
        if len == 0 {
            return false;
        }
        self.current_index = match self.mode {
            ImageMode::Folder => rng.gen_range(0..len),
            ImageMode::List => (self.current_index + 1) % len,
            ImageMode::Single | ImageMode::Script => return false,
        };
        self.show(self.sources[self.current_index].clone())
    }

    /// Display an image. Showing the image already on screen is a no-op.
    fn show(&mut self, path: PathBuf) -> bool {
        if self.displayed.as_ref() == Some(&path) {
            return false;
        }
        self.displayed = Some(path);
        self.zoom.reset();
        true
    }

    /// Snapshot for saving in a layout.
    pub fn settings(&self) -> ImageSettings {
        ImageSettings {
            mode: self.mode,
            interval: self.interval_secs(),
            sources: self.sources.clone(),
            current_index: self.current_index,
            document_path: self.document_path.clone(),
            script_entries: self.script_entries.clone(),
        }
    }
}

/// Image files directly inside `dir`, sorted by path.
pub fn folder_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)$")?;
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read folder {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.is_match(n))
        })
        .collect();
    images.sort();
    Ok(images)
}
