use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reader::autoscroll::{self, ReadingMode};
use crate::reader::immersive::DEFAULT_INACTIVITY_DELAY;

const FILENAME: &str = "config.yaml";
pub const APP_DIR: &str = "picturestory";

pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 32.0;
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

const VALID_KEYS: &str = "defaults.theme, defaults.reading_mode, defaults.scroll_speed, \
    defaults.font_size, defaults.font_family, defaults.slideshow_interval, \
    defaults.inactivity_delay";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_mode: Option<ReadingMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_speed: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,

    /// Seconds between slideshow steps for new image widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slideshow_interval: Option<u64>,

    /// Seconds without activity before the controls hide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_delay: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    Proportional,
    Monospace,
}

impl FontFamily {
    pub const ALL: [FontFamily; 2] = [Self::Proportional, Self::Monospace];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "proportional" => Some(Self::Proportional),
            "monospace" => Some(Self::Monospace),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Proportional => "Proportional",
            Self::Monospace => "Monospace",
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `picturestory config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default config: {e}");
                Self::default()
            }
        }
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
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# PictureStory configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let defaults = self.defaults.get_or_insert_with(DefaultsConfig::default);
        match key {
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                defaults.theme = Some(value.to_string());
            }
            "defaults.reading_mode" => {
                let Some(mode) = ReadingMode::from_name(value) else {
                    anyhow::bail!(
                        "Invalid reading_mode: {value}. Must be 'vertical', 'horizontal', or 'book'."
                    );
                };
                defaults.reading_mode = Some(mode);
            }
            "defaults.scroll_speed" => {
                let speed = parse_in_range(value, autoscroll::MIN_SPEED, autoscroll::MAX_SPEED)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid scroll_speed: {value}. Must be a number from {} to {}.",
                            autoscroll::MIN_SPEED,
                            autoscroll::MAX_SPEED
                        )
                    })?;
                defaults.scroll_speed = Some(speed);
            }
            "defaults.font_size" => {
                let size = parse_in_range(value, MIN_FONT_SIZE, MAX_FONT_SIZE).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid font_size: {value}. Must be a number from {MIN_FONT_SIZE} to {MAX_FONT_SIZE}."
                    )
                })?;
                defaults.font_size = Some(size);
            }
            "defaults.font_family" => {
                let Some(family) = FontFamily::from_name(value) else {
                    anyhow::bail!(
                        "Invalid font_family: {value}. Must be 'proportional' or 'monospace'."
                    );
                };
                defaults.font_family = Some(family);
            }
            "defaults.slideshow_interval" => {
                defaults.slideshow_interval = Some(parse_seconds(value, "slideshow_interval")?);
            }
            "defaults.inactivity_delay" => {
                defaults.inactivity_delay = Some(parse_seconds(value, "inactivity_delay")?);
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }

    fn defaults(&self) -> DefaultsConfig {
        self.defaults.clone().unwrap_or_default()
    }

    pub fn theme(&self) -> String {
        self.defaults().theme.unwrap_or_else(|| "light".to_string())
    }

    pub fn reading_mode(&self) -> ReadingMode {
        self.defaults().reading_mode.unwrap_or_default()
    }

    pub fn scroll_speed(&self) -> f32 {
        self.defaults()
            .scroll_speed
            .unwrap_or(autoscroll::DEFAULT_SPEED)
    }

    pub fn font_size(&self) -> f32 {
        self.defaults().font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn font_family(&self) -> FontFamily {
        self.defaults().font_family.unwrap_or_default()
    }

    pub fn slideshow_interval(&self) -> Option<u64> {
        self.defaults().slideshow_interval
    }

    pub fn inactivity_delay(&self) -> Duration {
        self.defaults()
            .inactivity_delay
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INACTIVITY_DELAY)
    }
}

fn parse_in_range(value: &str, min: f32, max: f32) -> Option<f32> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn parse_seconds(value: &str, name: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(secs) if secs >= 1 => Ok(secs),
        _ => anyhow::bail!("Invalid {name}: {value}. Must be a whole number of seconds, at least 1."),
    }
}
