use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sync::{WidgetId, WidgetMessage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoMode {
    /// Loop the current clip.
    #[default]
    Single,
    /// Move on to the next clip when one ends.
    Playlist,
}

impl VideoMode {
    pub const ALL: [VideoMode; 2] = [Self::Single, Self::Playlist];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Single => "Single (loop)",
            Self::Playlist => "Playlist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(default)]
    pub mode: VideoMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<PathBuf>,

    #[serde(default)]
    pub current_index: usize,

    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default)]
    pub muted: bool,
}

fn default_volume() -> f32 {
    1.0
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            mode: VideoMode::default(),
            sources: Vec::new(),
            current_index: 0,
            volume: default_volume(),
            muted: false,
        }
    }
}

pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "ogg", "mov"];

/// Playlist and transport state of a video widget window.
#[derive(Debug)]
pub struct VideoWidget {
    id: WidgetId,
    mode: VideoMode,
    sources: Vec<PathBuf>,
    current_index: usize,
    playing: bool,
    volume: f32,
    muted: bool,
    immersive: bool,
}

impl VideoWidget {
    pub fn new(id: WidgetId, settings: VideoSettings) -> Self {
        let current_index = if settings.sources.is_empty() {
            0
        } else {
            settings.current_index.min(settings.sources.len() - 1)
        };
        Self {
            id,
            mode: settings.mode,
            sources: settings.sources,
            current_index,
            playing: false,
            volume: settings.volume.clamp(0.0, 1.0),
            muted: settings.muted,
            immersive: false,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    pub fn current(&self) -> Option<&Path> {
        self.sources.get(self.current_index).map(PathBuf::as_path)
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_looping(&self) -> bool {
        self.mode == VideoMode::Single
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive
    }

    /// Previous/next are only meaningful with more than one clip.
    pub fn can_navigate(&self) -> bool {
        self.sources.len() > 1
    }

    pub fn handle(&mut self, message: WidgetMessage) {
        match message {
            WidgetMessage::Immersive(immersive) => self.immersive = immersive,
            // Video playback does not follow the reading position.
            WidgetMessage::Init(_) | WidgetMessage::Position(_) | WidgetMessage::ScriptChanged => {}
        }
    }

    pub fn set_mode(&mut self, mode: VideoMode) {
        self.mode = mode;
    }

    pub fn set_sources(&mut self, sources: Vec<PathBuf>) {
        if sources.is_empty() {
            return;
        }
        self.sources = sources;
        self.current_index = 0;
    }

    pub fn toggle_playback(&mut self) {
        self.playing = !self.playing && self.current().is_some();
    }

    pub fn next(&mut self) {
        if !self.can_navigate() {
            return;
        }
        self.current_index = (self.current_index + 1) % self.sources.len();
    }

    pub fn previous(&mut self) {
        if !self.can_navigate() {
            return;
        }
        let len = self.sources.len();
        self.current_index = (self.current_index + len - 1) % len;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Volume 0 mutes; raising it again unmutes.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.volume == 0.0 {
            self.muted = true;
        } else if self.muted {
            self.muted = false;
        }
    }

    /// Volume as the slider should show it: zero while muted.
    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    pub fn settings(&self) -> VideoSettings {
        VideoSettings {
            mode: self.mode,
            sources: self.sources.clone(),
            current_index: self.current_index,
            volume: self.volume,
            muted: self.muted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(names: &[&str]) -> VideoWidget {
        VideoWidget::new(
            WidgetId(1),
            VideoSettings {
                mode: VideoMode::Playlist,
                sources: names.iter().map(PathBuf::from).collect(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut video = playlist(&["a.mp4", "b.mp4", "c.mp4"]);
        video.previous();
        assert_eq!(video.current(), Some(Path::new("c.mp4")));
        video.next();
        video.next();
        assert_eq!(video.current(), Some(Path::new("b.mp4")));
    }

    #[test]
    fn test_single_clip_cannot_navigate() {
        let mut video = playlist(&["only.mp4"]);
        assert!(!video.can_navigate());
        video.next();
        video.previous();
        assert_eq!(video.current_index(), 0);
    }

    #[test]
    fn test_loop_follows_mode() {
        let mut video = playlist(&["a.mp4"]);
        assert!(!video.is_looping());
        video.set_mode(VideoMode::Single);
        assert!(video.is_looping());
    }

    #[test]
    fn test_cannot_play_without_sources() {
        let mut video = playlist(&[]);
        video.toggle_playback();
        assert!(!video.is_playing());

        video.set_sources(vec![PathBuf::from("clip.webm")]);
        video.toggle_playback();
        assert!(video.is_playing());
        video.toggle_playback();
        assert!(!video.is_playing());
    }

    #[test]
    fn test_volume_zero_mutes_and_raise_unmutes() {
        let mut video = playlist(&["a.mp4"]);
        video.set_volume(0.0);
        assert!(video.is_muted());
        assert_eq!(video.effective_volume(), 0.0);
        video.set_volume(0.6);
        assert!(!video.is_muted());
        assert_eq!(video.effective_volume(), 0.6);
    }

    #[test]
    fn test_toggle_mute_keeps_volume() {
        let mut video = playlist(&["a.mp4"]);
        video.set_volume(0.4);
        video.toggle_mute();
        assert_eq!(video.effective_volume(), 0.0);
        video.toggle_mute();
        assert_eq!(video.effective_volume(), 0.4);
    }

    #[test]
    fn test_ignores_position_updates() {
        let mut video = playlist(&["a.mp4", "b.mp4"]);
        video.handle(WidgetMessage::Position(crate::sync::PositionUpdate {
            line_number: 40,
            document_path: None,
        }));
        assert_eq!(video.current_index(), 0);
        video.handle(WidgetMessage::Immersive(true));
        assert!(video.is_immersive());
    }

    #[test]
    fn test_settings_clamped_on_init() {
        let video = VideoWidget::new(
            WidgetId(2),
            VideoSettings {
                sources: vec![PathBuf::from("a.mp4")],
                current_index: 5,
                volume: 3.0,
                ..Default::default()
            },
        );
        assert_eq!(video.current_index(), 0);
        assert_eq!(video.volume(), 1.0);
        assert_eq!(video.settings().mode, VideoMode::Single);
    }
}
