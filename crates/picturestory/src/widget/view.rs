use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::slideshow::{self, ZOOM_STEP};
use super::video::VIDEO_EXTENSIONS;
use super::{ImageMode, ImageWidget, Placement, VideoMode, VideoWidget, WidgetSettings};
use crate::sync::{ReaderMessage, WidgetChannels, WidgetId, WidgetMessage};
use crate::theme::Theme;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const TEXTURE_CACHE_LIMIT: usize = 32;

/// What a widget window shows, built from its init message.
pub enum WidgetBody {
    Image(ImageWidget),
    Video(VideoWidget),
}

impl WidgetBody {
    fn handle(&mut self, message: WidgetMessage, now: Instant) {
        match self {
            Self::Image(image) => image.handle(message, now),
            Self::Video(video) => video.handle(message),
        }
    }

    fn is_immersive(&self) -> bool {
        match self {
            Self::Image(image) => image.is_immersive(),
            Self::Video(video) => video.is_immersive(),
        }
    }

    fn settings(&self) -> WidgetSettings {
        match self {
            Self::Image(image) => WidgetSettings::Image(image.settings()),
            Self::Video(video) => WidgetSettings::Video(video.settings()),
        }
    }
}

/// Decoded images, keyed by path. Failed loads are remembered as `None`.
#[derive(Default)]
struct TextureCache {
    textures: HashMap<PathBuf, Option<TextureHandle>>,
}

impl TextureCache {
    fn get(&mut self, ctx: &egui::Context, path: &Path) -> Option<TextureHandle> {
        if let Some(entry) = self.textures.get(path) {
            return entry.clone();
        }
        if self.textures.len() >= TEXTURE_CACHE_LIMIT {
            self.textures.clear();
        }

        let texture = match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (w, h) = rgba.dimensions();
                let color_image =
                    ColorImage::from_rgba_unmultiplied([w as usize, h as usize], rgba.as_raw());
                Some(ctx.load_texture(
                    path.display().to_string(),
                    color_image,
                    TextureOptions::LINEAR,
                ))
            }
            Err(e) => {
                log::warn!("Failed to load image {}: {e}", path.display());
                None
            }
        };
        self.textures.insert(path.to_path_buf(), texture.clone());
        texture
    }
}

/// A widget hosted in its own native window.
pub struct WidgetWindow {
    id: WidgetId,
    channels: WidgetChannels,
    body: Option<WidgetBody>,
    placement: Placement,
    open: bool,
    textures: TextureCache,
}

impl WidgetWindow {
    pub fn new(id: WidgetId, channels: WidgetChannels, placement: Placement) -> Self {
        Self {
            id,
            channels,
            body: None,
            placement,
            open: true,
            textures: TextureCache::default(),
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Last known window geometry.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Current settings, once the init message has been handled.
    pub fn settings(&self) -> Option<WidgetSettings> {
        self.body.as_ref().map(WidgetBody::settings)
    }

    /// When the hosting app must repaint so the slideshow can advance.
    pub fn next_repaint(&self, now: Instant) -> Option<std::time::Duration> {
        match &self.body {
            Some(WidgetBody::Image(image)) => image.next_advance_in(now),
            _ => None,
        }
    }

    fn title(&self) -> String {
        match &self.body {
            Some(WidgetBody::Video(_)) => format!("Video {}", self.id.0),
            _ => format!("Image {}", self.id.0),
        }
    }

    fn drain_inbox(&mut self, now: Instant) {
        while let Ok(message) = self.channels.inbox.try_recv() {
            match message {
                WidgetMessage::Init(_) if self.body.is_some() => {
                    log::debug!("{} ignoring repeated init", self.id);
                }
                WidgetMessage::Init(init) => {
                    log::debug!("{} initialized as {}", init.id, init.kind.display_name());
                    self.body = Some(match init.settings {
                        WidgetSettings::Image(settings) => {
                            WidgetBody::Image(ImageWidget::new(init.id, settings, now))
                        }
                        WidgetSettings::Video(settings) => {
                            WidgetBody::Video(VideoWidget::new(init.id, settings))
                        }
                    });
                }
                // Nothing to update before init.
                message => {
                    if let Some(body) = &mut self.body {
                        body.handle(message, now);
                    }
                }
            }
        }
    }

    /// Draw the window for this frame. Call every frame while open.
    pub fn show(&mut self, ctx: &egui::Context, theme: &Theme) {
        if !self.open {
            return;
        }

        let builder = egui::ViewportBuilder::default()
            .with_title(self.title())
            .with_position([self.placement.x, self.placement.y])
            .with_inner_size([self.placement.width, self.placement.height])
            .with_min_inner_size([200.0, 150.0])
            .with_decorations(false)
            .with_window_level(egui::WindowLevel::AlwaysOnTop);

        let viewport_id = egui::ViewportId::from_hash_of(self.id);
        ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
            ctx.set_visuals(theme.visuals());
            self.update(ctx, theme);
        });
    }

    fn update(&mut self, ctx: &egui::Context, theme: &Theme) {
        let now = Instant::now();
        self.drain_inbox(now);

        let (close_requested, outer_rect, active) = ctx.input(|i| {
            let active = i.pointer.is_moving()
                || i.pointer.any_pressed()
                || !i.keys_down.is_empty()
                || i.raw_scroll_delta != egui::Vec2::ZERO;
            (
                i.viewport().close_requested(),
                i.viewport().outer_rect,
                active,
            )
        });
        if close_requested {
            self.open = false;
            return;
        }
        if let Some(rect) = outer_rect {
            self.placement = Placement {
                x: rect.min.x,
                y: rect.min.y,
                width: rect.width(),
                height: rect.height(),
            };
        }
        if active {
            // The reader may already be gone; nothing to do then.
            let _ = self.channels.reader.send(ReaderMessage::Activity(self.id));
        }

        let immersive = self.body.as_ref().is_some_and(WidgetBody::is_immersive);
        if !immersive {
            egui::TopBottomPanel::top(egui::Id::new(("widget_controls", self.id))).show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    let handle = ui
                        .add(egui::Label::new("⠿").sense(egui::Sense::drag()))
                        .on_hover_text("Drag to move");
                    if handle.drag_started() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
                    }
                    match &mut self.body {
                        Some(WidgetBody::Image(image)) => image_controls(ui, image, now),
                        Some(WidgetBody::Video(video)) => video_controls(ui, video),
                        None => {}
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("✕").on_hover_text("Close").clicked() {
                            self.open = false;
                        }
                    });
                });
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme.background))
            .show(ctx, |ui| match &mut self.body {
                Some(WidgetBody::Image(image)) => {
                    draw_image(ui, ctx, image, &mut self.textures, theme);
                }
                Some(WidgetBody::Video(video)) => draw_video(ui, ctx, video, theme),
                None => {
                    ui.centered_and_justified(|ui| ui.spinner());
                }
            });

        if let Some(WidgetBody::Image(image)) = &mut self.body {
            image.tick(now, &mut rand::thread_rng());
            if let Some(wait) = image.next_advance_in(now) {
                ctx.request_repaint_after(wait);
            }
        }
    }
}

fn image_controls(ui: &mut egui::Ui, image: &mut ImageWidget, now: Instant) {
    let mut mode = image.mode();
    egui::ComboBox::from_id_salt("image_mode")
        .selected_text(mode.display_name())
        .show_ui(ui, |ui| {
            for option in ImageMode::ALL {
                ui.selectable_value(&mut mode, option, option.display_name());
            }
        });
    if mode != image.mode() {
        image.set_mode(mode, now);
    }

    if ui.button("Load").clicked() {
        load_image_sources(image, now);
    }

    let play_label = if image.is_playing() { "⏸" } else { "▶" };
    let can_play = matches!(image.mode(), ImageMode::List | ImageMode::Folder)
        && image.sources().len() > 1;
    if ui
        .add_enabled(can_play, egui::Button::new(play_label))
        .on_hover_text("Play/pause slideshow")
        .clicked()
    {
        image.toggle_playback(now);
    }

    let mut interval = image.interval_secs();
    let response = ui.add(
        egui::DragValue::new(&mut interval)
            .range(1..=3600)
            .suffix(" s"),
    );
    if response.changed() {
        image.set_interval(interval, now);
    }

    if let Some(notice) = image.notice().map(str::to_string) {
        ui.colored_label(ui.visuals().warn_fg_color, notice);
        if ui.small_button("OK").clicked() {
            image.dismiss_notice();
        }
    }
}

fn load_image_sources(image: &mut ImageWidget, now: Instant) {
    match image.mode() {
        ImageMode::Script => {
            image.load_script(now);
        }
        ImageMode::Folder => {
            let Some(dir) = rfd::FileDialog::new().pick_folder() else {
                return;
            };
            match slideshow::folder_images(&dir) {
                Ok(images) => image.set_sources(images, now),
                Err(e) => log::warn!("{e:#}"),
            }
        }
        ImageMode::Single | ImageMode::List => {
            let dialog = rfd::FileDialog::new().add_filter("Images", &IMAGE_EXTENSIONS);
            let picked = if image.mode() == ImageMode::Single {
                dialog.pick_file().map(|p| vec![p])
            } else {
                dialog.pick_files()
            };
            if let Some(paths) = picked {
                image.set_sources(paths, now);
            }
        }
    }
}

fn draw_image(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    image: &mut ImageWidget,
    textures: &mut TextureCache,
    theme: &Theme,
) {
    let rect = ui.max_rect();
    let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());

    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            image.zoom.zoom_by(ZOOM_STEP * scroll.signum());
        }
    }
    if response.double_clicked() {
        image.zoom.reset();
    }
    if response.drag_started() && !image.zoom.begin_pan() {
        // Not zoomed in: dragging the picture moves the window.
        ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
    }
    if response.dragged() {
        let delta = response.drag_delta();
        image.zoom.pan_by(delta.x, delta.y);
    }
    if response.drag_stopped() {
        image.zoom.end_pan();
    }

    let painter = ui.painter_at(rect);
    let Some(path) = image.displayed().map(Path::to_path_buf) else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "No image loaded",
            egui::FontId::proportional(16.0),
            theme.muted,
        );
        return;
    };
    let Some(texture) = textures.get(ctx, &path) else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            format!("Cannot display {}", file_label(&path)),
            egui::FontId::proportional(16.0),
            theme.muted,
        );
        return;
    };

    let size = texture.size_vec2();
    let fit = (rect.width() / size.x).min(rect.height() / size.y);
    let scaled = size * fit * image.zoom.level;
    let center = rect.center() + egui::vec2(image.zoom.offset[0], image.zoom.offset[1]);
    let image_rect = egui::Rect::from_center_size(center, scaled);
    painter.image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        Color32::WHITE,
    );
}

fn video_controls(ui: &mut egui::Ui, video: &mut VideoWidget) {
    let mut mode = video.mode();
    egui::ComboBox::from_id_salt("video_mode")
        .selected_text(mode.display_name())
        .show_ui(ui, |ui| {
            for option in VideoMode::ALL {
                ui.selectable_value(&mut mode, option, option.display_name());
            }
        });
    if mode != video.mode() {
        video.set_mode(mode);
    }

    if ui.button("Load").clicked() {
        let dialog = rfd::FileDialog::new().add_filter("Videos", &VIDEO_EXTENSIONS);
        let picked = match video.mode() {
            VideoMode::Single => dialog.pick_file().map(|p| vec![p]),
            VideoMode::Playlist => dialog.pick_files(),
        };
        if let Some(paths) = picked {
            video.set_sources(paths);
        }
    }

    let navigate = video.can_navigate();
    if ui.add_enabled(navigate, egui::Button::new("⏮")).clicked() {
        video.previous();
    }
    let play_label = if video.is_playing() { "⏸" } else { "▶" };
    if ui.button(play_label).clicked() {
        video.toggle_playback();
    }
    if ui.add_enabled(navigate, egui::Button::new("⏭")).clicked() {
        video.next();
    }

    let mute_label = if video.is_muted() { "🔇" } else { "🔊" };
    if ui.button(mute_label).clicked() {
        video.toggle_mute();
    }
    let mut volume = video.effective_volume();
    if ui
        .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
        .changed()
    {
        video.set_volume(volume);
    }
}

fn draw_video(ui: &mut egui::Ui, ctx: &egui::Context, video: &VideoWidget, theme: &Theme) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        let Some(path) = video.current() else {
            ui.colored_label(theme.muted, "No video loaded");
            return;
        };

        ui.heading(file_label(path));
        let mut status = if video.is_playing() { "Playing" } else { "Paused" }.to_string();
        if video.is_looping() {
            status.push_str(" · loop");
        }
        if video.sources().len() > 1 {
            status.push_str(&format!(
                " · {}/{}",
                video.current_index() + 1,
                video.sources().len()
            ));
        }
        ui.colored_label(theme.muted, status);

        if ui.button("Open in system player").clicked() {
            ctx.open_url(egui::OpenUrl::same_tab(format!("file://{}", path.display())));
        }
    });
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
