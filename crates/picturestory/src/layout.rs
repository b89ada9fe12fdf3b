use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{APP_DIR, FontFamily};
use crate::reader::autoscroll::ReadingMode;
use crate::widget::{Placement, WidgetSettings};

const FILENAME: &str = "layout.yaml";

/// A saved reading session: the document, reader settings and open widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,

    #[serde(default)]
    pub reading_mode: ReadingMode,

    pub scroll_speed: f32,

    pub font_size: f32,

    #[serde(default)]
    pub font_family: FontFamily,

    #[serde(default)]
    pub widgets: Vec<WidgetLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetLayout {
    #[serde(flatten)]
    pub placement: Placement,

    pub settings: WidgetSettings,
}

impl Layout {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("No saved layout at {}", path.display()))?;
        let layout: Layout = serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid layout file {}", path.display()))?;
        log::info!(
            "Loaded layout with {} widget(s) from {}",
            layout.widgets.len(),
            path.display()
        );
        Ok(layout)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)
            .with_context(|| format!("Failed to write layout {}", path.display()))?;
        log::info!("Saved layout to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ScriptEntry;
    use crate::widget::{ImageMode, ImageSettings, VideoMode, VideoSettings};
    use tempfile::TempDir;

    fn sample() -> Layout {
        Layout {
            document: Some(PathBuf::from("/books/story.txt")),
            reading_mode: ReadingMode::Book,
            scroll_speed: 4.5,
            font_size: 18.0,
            font_family: FontFamily::Monospace,
            widgets: vec![
                WidgetLayout {
                    placement: Placement {
                        x: 50.0,
                        y: 50.0,
                        width: 400.0,
                        height: 300.0,
                    },
                    settings: WidgetSettings::Image(ImageSettings {
                        mode: ImageMode::Script,
                        document_path: Some(PathBuf::from("/books/story.txt")),
                        script_entries: vec![ScriptEntry {
                            start_line: 0,
                            end_line: 10,
                            image_path: PathBuf::from("/books/cover.png"),
                        }],
                        ..Default::default()
                    }),
                },
                WidgetLayout {
                    placement: Placement {
                        x: 70.0,
                        y: 70.0,
                        width: 480.0,
                        height: 320.0,
                    },
                    settings: WidgetSettings::Video(VideoSettings {
                        mode: VideoMode::Playlist,
                        sources: vec![PathBuf::from("/clips/a.mp4"), PathBuf::from("/clips/b.mp4")],
                        current_index: 1,
                        volume: 0.5,
                        muted: true,
                    }),
                },
            ],
        }
    }

    #[test]
    fn test_save_and_load_preserves_widgets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILENAME);
        let layout = sample();
        layout.save_to(&path).unwrap();
        assert_eq!(Layout::load_from(&path).unwrap(), layout);
    }

    #[test]
    fn test_widget_fields_are_flat() {
        let yaml = serde_yaml::to_string(&sample()).unwrap();
        assert!(yaml.contains("reading_mode: book"), "{yaml}");
        assert!(yaml.contains("- x: 50.0"), "{yaml}");
        assert!(yaml.contains("kind: video"), "{yaml}");
    }

    #[test]
    fn test_missing_layout_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Layout::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("No saved layout"), "{err}");
    }
}
