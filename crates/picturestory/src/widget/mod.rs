pub mod slideshow;
pub mod video;
pub mod view;

use serde::{Deserialize, Serialize};

pub use slideshow::{ImageMode, ImageSettings, ImageWidget};
pub use video::{VideoMode, VideoSettings, VideoWidget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Image,
    Video,
}

impl WidgetKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
        }
    }

    /// Initial window size in logical pixels.
    pub fn default_size(&self) -> [f32; 2] {
        match self {
            Self::Image => [400.0, 300.0],
            Self::Video => [480.0, 320.0],
        }
    }
}

/// Per-kind widget settings, as carried by the init message and saved layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WidgetSettings {
    Image(ImageSettings),
    Video(VideoSettings),
}

impl WidgetSettings {
    pub fn default_for(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Image => Self::Image(ImageSettings::default()),
            WidgetKind::Video => Self::Video(VideoSettings::default()),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Image(_) => WidgetKind::Image,
            Self::Video(_) => WidgetKind::Video,
        }
    }
}

/// Window geometry of a widget, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

const CASCADE_ORIGIN: f32 = 50.0;
const CASCADE_STEP: f32 = 20.0;

/// Position for a new widget: just below and right of the furthest existing one.
pub fn cascade_position(existing: &[Placement]) -> [f32; 2] {
    if existing.is_empty() {
        return [CASCADE_ORIGIN, CASCADE_ORIGIN];
    }
    let max_x = existing.iter().map(|p| p.x).fold(f32::MIN, f32::max);
    let max_y = existing.iter().map(|p| p.y).fold(f32::MIN, f32::max);
    [max_x + CASCADE_STEP, max_y + CASCADE_STEP]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> Placement {
        Placement {
            x,
            y,
            width: 400.0,
            height: 300.0,
        }
    }

    #[test]
    fn test_first_widget_at_origin() {
        assert_eq!(cascade_position(&[]), [50.0, 50.0]);
    }

    #[test]
    fn test_cascade_from_furthest() {
        let existing = [at(50.0, 50.0), at(300.0, 70.0), at(90.0, 200.0)];
        assert_eq!(cascade_position(&existing), [320.0, 220.0]);
    }

    #[test]
    fn test_settings_kind_tag() {
        let settings = WidgetSettings::default_for(WidgetKind::Video);
        assert_eq!(settings.kind(), WidgetKind::Video);

        let yaml = serde_yaml::to_string(&WidgetSettings::default_for(WidgetKind::Image)).unwrap();
        assert!(yaml.contains("kind: image"), "{yaml}");
        assert!(yaml.contains("mode: single"), "{yaml}");
    }
}
