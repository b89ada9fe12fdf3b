use eframe::egui;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::autoscroll::{self, AutoScroll, ReadingMode};
use super::controller::ReaderController;
use super::immersive::InactivityTimer;
use crate::config::{Config, FontFamily, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::document::extract::DocumentFormat;
use crate::layout::{Layout, WidgetLayout};
use crate::sync::{ReaderMessage, Span};
use crate::theme::Theme;
use crate::watch::ScriptWatcher;
use crate::widget::view::WidgetWindow;
use crate::widget::{self, Placement, WidgetKind, WidgetSettings};

const TOAST_DURATION: f32 = 2.5;
const TOAST_FADE_START: f32 = 2.0;
const WATCH_POLL: Duration = Duration::from_millis(500);
const PARAGRAPH_GAP: f32 = 14.0;

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        if elapsed < TOAST_FADE_START {
            1.0
        } else if elapsed < TOAST_DURATION {
            1.0 - (elapsed - TOAST_FADE_START) / (TOAST_DURATION - TOAST_FADE_START)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= TOAST_DURATION
    }
}

/// Scroll geometry seen on the last frame, along the reading axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollGeometry {
    viewport: Span,
    content: f32,
}

struct ReaderApp {
    controller: ReaderController,
    theme: Theme,
    reading_mode: ReadingMode,
    font_size: f32,
    font_family: FontFamily,
    slideshow_interval: Option<u64>,
    autoscroll: AutoScroll,
    inactivity: InactivityTimer,
    widgets: Vec<WidgetWindow>,
    watcher: Option<ScriptWatcher>,
    toast: Option<Toast>,
    /// Offset to force on the scroll area next frame.
    pending_offset: Option<f32>,
    geometry: Option<ScrollGeometry>,
    /// Set when paragraph positions may have moved without a scroll.
    relayout: bool,
}

impl ReaderApp {
    fn new(config: &Config) -> Self {
        Self {
            controller: ReaderController::new(),
            theme: Theme::from_name(&config.theme()),
            reading_mode: config.reading_mode(),
            font_size: config.font_size().clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            font_family: config.font_family(),
            slideshow_interval: config.slideshow_interval(),
            autoscroll: AutoScroll::new(config.scroll_speed()),
            inactivity: InactivityTimer::new(config.inactivity_delay()),
            widgets: Vec::new(),
            watcher: None,
            toast: None,
            pending_offset: None,
            geometry: None,
            relayout: true,
        }
    }

    fn document_loaded(&self) -> bool {
        self.controller.document().is_some()
    }

    fn display_title(&self) -> String {
        match self.controller.document() {
            Some(document) => format!("PictureStory - {}", document.display_name()),
            None => "PictureStory".to_string(),
        }
    }

    fn open_document(&mut self, ctx: &egui::Context, path: PathBuf) {
        if let Err(e) = self.controller.open_document(&path) {
            log::warn!("{e:#}");
            self.toast = Some(Toast::new(format!("{e}")));
            return;
        }

        self.watcher = match ScriptWatcher::start(&path) {
            Ok(watcher) => watcher,
            Err(e) => {
                log::warn!("{e:#}");
                None
            }
        };
        self.autoscroll.stop();
        self.pending_offset = Some(0.0);
        self.geometry = None;
        self.relayout = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.display_title()));
    }

    fn pick_document(&mut self, ctx: &egui::Context) {
        let picked = rfd::FileDialog::new()
            .add_filter("Documents", &DocumentFormat::EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.open_document(ctx, path);
        }
    }

    fn set_reading_mode(&mut self, mode: ReadingMode) {
        if mode == self.reading_mode {
            return;
        }
        self.reading_mode = mode;
        self.pending_offset = Some(0.0);
        self.geometry = None;
        self.relayout = true;
        if self.autoscroll.is_playing() {
            self.autoscroll.start(0.0);
        }
    }

    fn set_scroll_speed(&mut self, speed: f32) {
        self.autoscroll.set_speed(speed);
        if self.autoscroll.is_playing() {
            self.autoscroll.start(self.scroll_offset());
        }
    }

    fn toggle_autoscroll(&mut self) {
        if self.autoscroll.is_playing() {
            self.autoscroll.stop();
        } else if self.document_loaded() {
            self.autoscroll.start(self.scroll_offset());
        }
    }

    fn scroll_offset(&self) -> f32 {
        self.geometry.map(|g| g.viewport.start).unwrap_or(0.0)
    }

    fn set_font_size(&mut self, size: f32) {
        self.font_size = size.round().clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.relayout = true;
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.toast = Some(Toast::new(format!("Theme: {}", self.theme.name)));
    }

    fn spawn_widget(&mut self, settings: WidgetSettings, placement: Option<Placement>) {
        let placement = placement.unwrap_or_else(|| {
            let existing: Vec<Placement> = self.widgets.iter().map(WidgetWindow::placement).collect();
            let [x, y] = widget::cascade_position(&existing);
            let [width, height] = settings.kind().default_size();
            Placement {
                x,
                y,
                width,
                height,
            }
        });
        let (widget, channels) = self.controller.spawn_widget(settings);
        self.widgets
            .push(WidgetWindow::new(widget.id, channels, placement));
    }

    fn add_widget(&mut self, kind: WidgetKind) {
        let mut settings = WidgetSettings::default_for(kind);
        if let WidgetSettings::Image(image) = &mut settings {
            image.document_path = self.controller.state().document_path.clone();
            if let Some(interval) = self.slideshow_interval {
                image.interval = interval;
            }
        }
        self.spawn_widget(settings, None);
    }

    fn close_all_widgets(&mut self) {
        for window in self.widgets.drain(..) {
            self.controller.close_widget(window.id());
        }
    }

    fn current_layout(&self) -> Layout {
        Layout {
            document: self.controller.state().document_path.clone(),
            reading_mode: self.reading_mode,
            scroll_speed: self.autoscroll.speed(),
            font_size: self.font_size,
            font_family: self.font_family,
            widgets: self
                .widgets
                .iter()
                .filter_map(|window| {
                    Some(WidgetLayout {
                        placement: window.placement(),
                        settings: window.settings()?,
                    })
                })
                .collect(),
        }
    }

    fn save_layout(&mut self) {
        let message = match self.current_layout().save() {
            Ok(path) => format!("Layout saved to {}", path.display()),
            Err(e) => {
                log::warn!("{e:#}");
                format!("Failed to save layout: {e}")
            }
        };
        self.toast = Some(Toast::new(message));
    }

    fn load_layout(&mut self, ctx: &egui::Context) {
        match Layout::load() {
            Ok(layout) => self.apply_layout(ctx, layout),
            Err(e) => {
                log::warn!("{e:#}");
                self.toast = Some(Toast::new(format!("{e}")));
            }
        }
    }

    fn apply_layout(&mut self, ctx: &egui::Context, layout: Layout) {
        self.close_all_widgets();
        if let Some(document) = layout.document {
            self.open_document(ctx, document);
        }
        self.set_reading_mode(layout.reading_mode);
        self.set_scroll_speed(layout.scroll_speed);
        self.set_font_size(layout.font_size);
        self.font_family = layout.font_family;
        for widget in layout.widgets {
            self.spawn_widget(widget.settings, Some(widget.placement));
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let mut open = false;
        let mut toggle_play = false;
        let mut toggle_theme = false;
        let mut font_delta = 0.0;
        let mut escape = false;

        ctx.input(|i| {
            if i.modifiers.command && i.key_pressed(egui::Key::O) {
                open = true;
            }
            if i.key_pressed(egui::Key::Space) {
                toggle_play = true;
            }
            if i.key_pressed(egui::Key::D) && !i.modifiers.command {
                toggle_theme = true;
            }
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                font_delta += 1.0;
            }
            if i.key_pressed(egui::Key::Minus) {
                font_delta -= 1.0;
            }
            escape = i.key_pressed(egui::Key::Escape);
        });

        // Keys typed into a control belong to that control.
        if ctx.wants_keyboard_input() {
            return;
        }
        if open {
            self.pick_document(ctx);
        }
        if toggle_play {
            self.toggle_autoscroll();
        }
        if toggle_theme {
            self.toggle_theme();
        }
        if font_delta != 0.0 {
            self.set_font_size(self.font_size + font_delta);
        }
        if escape {
            self.on_activity(Instant::now());
        }
    }

    fn on_activity(&mut self, now: Instant) {
        let loaded = self.document_loaded();
        if let Some(immersive) = self.inactivity.activity(now, loaded) {
            self.controller.set_immersive(immersive);
        }
    }

    fn update_immersive(&mut self, ctx: &egui::Context, now: Instant) {
        let user_active = ctx.input(|i| {
            i.pointer.is_moving()
                || i.pointer.any_pressed()
                || !i.keys_down.is_empty()
                || i.raw_scroll_delta != egui::Vec2::ZERO
        });
        let widget_active = self
            .controller
            .poll_reader_messages()
            .iter()
            .any(|message| matches!(message, ReaderMessage::Activity(_)));
        if user_active || widget_active {
            self.on_activity(now);
        }

        let loaded = self.document_loaded();
        if let Some(immersive) = self.inactivity.poll(now, loaded) {
            log::debug!("Immersive mode on");
            self.controller.set_immersive(immersive);
        }
        if let Some(wait) = self.inactivity.remaining(now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn check_script_changes(&mut self, ctx: &egui::Context) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        if watcher.changed() {
            self.controller.notify_script_changed();
        }
        ctx.request_repaint_after(WATCH_POLL);
    }

    fn draw_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("reader_controls").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button("Open").on_hover_text("Open a document (Ctrl+O)").clicked() {
                    self.pick_document(ctx);
                }
                ui.separator();

                let mut mode = self.reading_mode;
                egui::ComboBox::from_id_salt("reading_mode")
                    .selected_text(mode.display_name())
                    .show_ui(ui, |ui| {
                        for option in ReadingMode::ALL {
                            ui.selectable_value(&mut mode, option, option.display_name());
                        }
                    });
                self.set_reading_mode(mode);

                let mut size = self.font_size;
                if ui
                    .add(
                        egui::DragValue::new(&mut size)
                            .range(MIN_FONT_SIZE..=MAX_FONT_SIZE)
                            .speed(1.0)
                            .suffix(" pt"),
                    )
                    .changed()
                {
                    self.set_font_size(size);
                }

                let mut family = self.font_family;
                egui::ComboBox::from_id_salt("font_family")
                    .selected_text(family.display_name())
                    .show_ui(ui, |ui| {
                        for option in FontFamily::ALL {
                            ui.selectable_value(&mut family, option, option.display_name());
                        }
                    });
                if family != self.font_family {
                    self.font_family = family;
                    self.relayout = true;
                }
                ui.separator();

                let play_label = if self.autoscroll.is_playing() { "Pause" } else { "Start" };
                if ui
                    .add_enabled(self.document_loaded(), egui::Button::new(play_label))
                    .on_hover_text("Auto-scroll (Space)")
                    .clicked()
                {
                    self.toggle_autoscroll();
                }
                let mut speed = self.autoscroll.speed();
                if ui
                    .add(
                        egui::Slider::new(&mut speed, autoscroll::MIN_SPEED..=autoscroll::MAX_SPEED)
                            .step_by(0.5)
                            .text("speed"),
                    )
                    .changed()
                {
                    self.set_scroll_speed(speed);
                }
                ui.separator();

                if ui.button("+ Image").clicked() {
                    self.add_widget(WidgetKind::Image);
                }
                if ui.button("+ Video").clicked() {
                    self.add_widget(WidgetKind::Video);
                }
                ui.separator();

                if ui.button("Save layout").clicked() {
                    self.save_layout();
                }
                if ui.button("Load layout").clicked() {
                    self.load_layout(ctx);
                }
                let theme_label = if self.theme.is_dark() { "☀" } else { "🌙" };
                if ui.button(theme_label).on_hover_text("Toggle theme (D)").clicked() {
                    self.toggle_theme();
                }
            });
        });
    }

    fn font_id(&self) -> egui::FontId {
        match self.font_family {
            FontFamily::Proportional => egui::FontId::proportional(self.font_size),
            FontFamily::Monospace => egui::FontId::monospace(self.font_size),
        }
    }

    /// Draw the document and report the reading position when it moved.
    fn draw_document(&mut self, ui: &mut egui::Ui, now: Instant) {
        let Some(document) = self.controller.document() else {
            ui.centered_and_justified(|ui| {
                ui.colored_label(self.theme.muted, "Open a document to start reading (Ctrl+O)");
            });
            return;
        };

        let horizontal = self.reading_mode.is_horizontal();
        if let Some(geometry) = self.geometry {
            if let Some(offset) =
                self.autoscroll
                    .step(self.reading_mode, now, geometry.content, geometry.viewport.extent)
            {
                self.pending_offset = Some(offset);
            }
        }

        let font = self.font_id();
        let color = self.theme.foreground;
        let mut area = if horizontal {
            egui::ScrollArea::both()
        } else {
            egui::ScrollArea::vertical()
        }
        .auto_shrink([false, false]);
        if let Some(offset) = self.pending_offset.take() {
            area = if horizontal {
                area.horizontal_scroll_offset(offset)
            } else {
                area.vertical_scroll_offset(offset)
            };
        }

        let available = ui.available_size();
        let column_width = match self.reading_mode {
            ReadingMode::Vertical => available.x,
            ReadingMode::Horizontal => (available.x / 2.0).clamp(240.0, 640.0),
            ReadingMode::Book => available.x,
        };

        let output = area.show(ui, |ui| {
            let mut rects = Vec::with_capacity(document.paragraphs.len());
            let mut layout = |ui: &mut egui::Ui| {
                for paragraph in &document.paragraphs {
                    let text = egui::RichText::new(&paragraph.text)
                        .font(font.clone())
                        .color(color);
                    let response = if horizontal {
                        ui.allocate_ui(egui::vec2(column_width - PARAGRAPH_GAP, available.y), |ui| {
                            ui.set_width(column_width - PARAGRAPH_GAP);
                            ui.add(egui::Label::new(text).wrap())
                        })
                        .response
                    } else {
                        ui.add(egui::Label::new(text).wrap())
                    };
                    rects.push(response.rect);
                    ui.add_space(PARAGRAPH_GAP);
                }
            };
            if horizontal {
                ui.horizontal_top(|ui| layout(ui));
            } else {
                ui.set_width(column_width);
                layout(ui);
            }
            rects
        });

        let inner = output.inner_rect;
        let (origin, offset, extent, content) = if horizontal {
            (
                inner.left(),
                output.state.offset.x,
                inner.width(),
                output.content_size.x,
            )
        } else {
            (
                inner.top(),
                output.state.offset.y,
                inner.height(),
                output.content_size.y,
            )
        };
        let spans: Vec<Span> = output
            .inner
            .iter()
            .map(|rect| {
                let (start, size) = if horizontal {
                    (rect.left(), rect.width())
                } else {
                    (rect.top(), rect.height())
                };
                Span::new(start - origin + offset, size)
            })
            .collect();

        let geometry = ScrollGeometry {
            viewport: Span::new(offset, extent),
            content,
        };
        if self.relayout || self.geometry != Some(geometry) {
            self.controller.on_scroll(geometry.viewport, &spans);
            self.relayout = false;
        }
        self.geometry = Some(geometry);

        if self.autoscroll.is_playing() {
            ui.ctx().request_repaint();
        }
    }

    fn draw_toast(&self, ctx: &egui::Context) {
        let Some(toast) = &self.toast else {
            return;
        };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }

        let rect = ctx.available_rect();
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("toast"),
        ));
        let toast_color = Theme::with_opacity(self.theme.foreground, opacity * 0.9);
        let toast_bg = Theme::with_opacity(self.theme.panel_background, opacity * 0.9);
        let galley = painter.layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(16.0),
            toast_color,
        );
        let padding = 12.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.bottom() - 72.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        painter.rect_filled(toast_rect, 8.0, toast_bg);
        let text_pos = egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding);
        painter.galley(text_pos, galley, toast_color);
        ctx.request_repaint();
    }

    fn show_widgets(&mut self, ctx: &egui::Context, now: Instant) {
        for window in &mut self.widgets {
            window.show(ctx, &self.theme);
            if let Some(wait) = window.next_repaint(now) {
                ctx.request_repaint_after(wait);
            }
        }

        let controller = &mut self.controller;
        self.widgets.retain(|window| {
            if window.is_open() {
                true
            } else {
                controller.close_widget(window.id());
                false
            }
        });
    }
}

impl eframe::App for ReaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        ctx.set_visuals(self.theme.visuals());

        self.handle_keys(ctx);
        self.update_immersive(ctx, now);
        self.check_script_changes(ctx);

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        if !self.inactivity.is_immersive() {
            self.draw_controls(ctx);
        }

        let bg = self.theme.background;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(24.0))
            .show(ctx, |ui| self.draw_document(ui, now));

        self.draw_toast(ctx);
        self.show_widgets(ctx, now);
    }
}

pub fn run(file: Option<PathBuf>, restore_layout: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default();

    let layout = if restore_layout {
        Some(Layout::load()?)
    } else {
        None
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title("PictureStory"),
        ..Default::default()
    };

    eframe::run_native(
        "PictureStory",
        options,
        Box::new(move |cc| {
            let mut app = ReaderApp::new(&config);
            if let Some(layout) = layout {
                app.apply_layout(&cc.egui_ctx, layout);
            }
            if let Some(file) = file {
                app.open_document(&cc.egui_ctx, file);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
