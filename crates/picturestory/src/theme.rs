use eframe::egui::{self, Color32};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub foreground: Color32,
    pub accent: Color32,
    pub panel_background: Color32,
    pub muted: Color32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            foreground: Color32::from_rgb(0xC8, 0xC8, 0xC8),
            accent: Color32::from_rgb(0x52, 0x94, 0xE2),
            panel_background: Color32::from_rgb(0x2D, 0x2D, 0x2D),
            muted: Color32::from_rgb(0x80, 0x80, 0x80),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::WHITE,
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            panel_background: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            muted: Color32::from_rgb(0x70, 0x70, 0x70),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    pub fn toggled(&self) -> Self {
        if self.is_dark() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    pub fn is_dark(&self) -> bool {
        self.name == "dark"
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }

    /// egui visuals matching this theme, applied to the reader and every widget window.
    pub fn visuals(&self) -> egui::Visuals {
        let mut visuals = if self.is_dark() {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.panel_fill = self.background;
        visuals.window_fill = self.panel_background;
        visuals.override_text_color = Some(self.foreground);
        visuals.hyperlink_color = self.accent;
        visuals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_is_light() {
        assert_eq!(Theme::from_name("solarized").name, "light");
        assert_eq!(Theme::from_name("dark").name, "dark");
    }

    #[test]
    fn test_toggle_round_trip() {
        let theme = Theme::light().toggled();
        assert!(theme.is_dark());
        assert!(!theme.toggled().is_dark());
    }

    #[test]
    fn test_with_opacity() {
        let color = Theme::with_opacity(Color32::from_rgb(10, 20, 30), 0.0);
        assert_eq!(color.a(), 0);
    }
}
