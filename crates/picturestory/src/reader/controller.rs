use anyhow::Result;
use std::path::Path;

use crate::document::Document;
use crate::sync::{
    Dispatcher, InitPayload, ReaderMessage, ReaderState, Span, WidgetChannels, WidgetId,
    WidgetMessage, WidgetRef, WidgetRegistry, estimator,
};
use crate::widget::WidgetSettings;

/// Application state of the reading surface, independent of how it is drawn.
///
/// Owns the open document, the reading position and every live widget. The
/// reading position is only written by [`ReaderController::on_scroll`].
#[derive(Debug, Default)]
pub struct ReaderController {
    state: ReaderState,
    document: Option<Document>,
    registry: WidgetRegistry,
    dispatcher: Dispatcher,
    next_widget_id: u64,
}

impl ReaderController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn widgets(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn open_document(&mut self, path: &Path) -> Result<()> {
        let document = Document::open(path)?;
        self.set_document(document);
        Ok(())
    }

    /// Replace the open document and reset the position to its start.
    pub fn set_document(&mut self, document: Document) {
        self.state = ReaderState {
            current_line_number: 0,
            document_path: Some(document.path.clone()),
        };
        self.document = Some(document);
    }

    /// Recompute the line being read after a scroll and publish it to every widget.
    ///
    /// `spans` holds the rendered extent of each paragraph, in document order.
    /// Returns the new line, or `None` when nothing is rendered yet.
    pub fn on_scroll(&mut self, viewport: Span, spans: &[Span]) -> Option<usize> {
        let document = self.document.as_ref()?;
        let placed = document.paragraphs.iter().zip(spans.iter().copied());
        let line = estimator::estimate_line(viewport, placed)?;

        self.state.current_line_number = line;
        self.dispatcher
            .publish_position(&self.state.position(), self.registry.iter());
        Some(line)
    }

    /// Register a new widget and queue its init message.
    ///
    /// The caller hosts the window and hands it the returned channels.
    pub fn spawn_widget(&mut self, settings: WidgetSettings) -> (WidgetRef, WidgetChannels) {
        self.next_widget_id += 1;
        let id = WidgetId(self.next_widget_id);
        let (window, channels) = self.dispatcher.open_window();
        let widget = WidgetRef { id, window };
        self.registry.insert(widget);

        let init = InitPayload {
            id,
            kind: settings.kind(),
            settings,
        };
        self.dispatcher.send(window, WidgetMessage::Init(init));
        log::debug!("Spawned {id}");
        (widget, channels)
    }

    /// Forget a widget whose window closed. Returns false if it was already gone.
    pub fn close_widget(&mut self, id: WidgetId) -> bool {
        match self.registry.remove(id) {
            Some(widget) => {
                self.dispatcher.close_window(widget.window);
                log::debug!("Closed {id}");
                true
            }
            None => false,
        }
    }

    pub fn set_immersive(&self, immersive: bool) -> usize {
        self.dispatcher
            .broadcast(self.registry.iter(), &WidgetMessage::Immersive(immersive))
    }

    pub fn notify_script_changed(&self) -> usize {
        log::info!("Image script changed, notifying widgets");
        self.dispatcher
            .broadcast(self.registry.iter(), &WidgetMessage::ScriptChanged)
    }

    /// Messages from widgets that are still registered.
    pub fn poll_reader_messages(&self) -> Vec<ReaderMessage> {
        self.dispatcher
            .drain_reader_messages()
            .into_iter()
            .filter(|message| match message {
                ReaderMessage::Activity(id) => self.registry.contains(*id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetKind;
    use std::path::PathBuf;

    const TEXT: &str = "one\ntwo\nthree\n\nfour\n\nfive\nsix";

    fn controller() -> ReaderController {
        let mut controller = ReaderController::new();
        controller.set_document(Document::from_text(PathBuf::from("/doc/book.txt"), TEXT));
        controller
    }

    fn spans() -> Vec<Span> {
        vec![
            Span::new(0.0, 90.0),
            Span::new(100.0, 30.0),
            Span::new(140.0, 60.0),
        ]
    }

    fn positions(channels: &WidgetChannels) -> Vec<usize> {
        channels
            .inbox
            .try_iter()
            .filter_map(|message| match message {
                WidgetMessage::Position(update) => Some(update.line_number),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_scroll_without_document() {
        let mut controller = ReaderController::new();
        assert_eq!(controller.on_scroll(Span::new(0.0, 100.0), &spans()), None);
        assert_eq!(controller.state().current_line_number, 0);
    }

    #[test]
    fn test_scroll_updates_state_and_publishes_once() {
        let mut controller = controller();
        let (_, channels) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));

        // Viewport midpoint 170 is halfway through the last paragraph (lines 4..=5).
        let line = controller.on_scroll(Span::new(120.0, 100.0), &spans());
        assert_eq!(line, Some(5));
        assert_eq!(controller.state().current_line_number, 5);
        assert_eq!(positions(&channels), vec![5]);
    }

    #[test]
    fn test_every_scroll_publishes() {
        let mut controller = controller();
        let (_, channels) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        controller.on_scroll(Span::new(0.0, 80.0), &spans());
        controller.on_scroll(Span::new(0.0, 80.0), &spans());
        assert_eq!(positions(&channels), vec![1, 1], "redundant updates are not coalesced");
    }

    #[test]
    fn test_spawn_sends_init_first() {
        let mut controller = controller();
        let (widget, channels) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Video));
        match channels.inbox.try_recv() {
            Ok(WidgetMessage::Init(init)) => {
                assert_eq!(init.id, widget.id);
                assert_eq!(init.kind, WidgetKind::Video);
            }
            other => panic!("expected init, got {other:?}"),
        }
        assert_eq!(controller.widgets().len(), 1);
    }

    #[test]
    fn test_widget_ids_are_unique() {
        let mut controller = controller();
        let (a, _) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        let (b, _) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        assert_ne!(a.id, b.id);
        assert_ne!(a.window, b.window);
    }

    #[test]
    fn test_closed_widget_receives_nothing() {
        let mut controller = controller();
        let (open, open_channels) =
            controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        let (closed, closed_channels) =
            controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        let _ = closed_channels.inbox.try_iter().count();

        assert!(controller.close_widget(closed.id));
        assert!(!controller.close_widget(closed.id), "removal happens exactly once");

        controller.on_scroll(Span::new(0.0, 80.0), &spans());
        assert_eq!(positions(&open_channels), vec![1]);
        assert!(closed_channels.inbox.try_recv().is_err());
        assert!(controller.widgets().contains(open.id));
        assert!(!controller.widgets().contains(closed.id));
    }

    #[test]
    fn test_broadcasts_reach_all_widgets() {
        let mut controller = controller();
        let (_, image) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        let (_, video) = controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Video));
        assert_eq!(controller.set_immersive(true), 2);
        assert_eq!(controller.notify_script_changed(), 2);

        for channels in [&image, &video] {
            let received: Vec<WidgetMessage> = channels.inbox.try_iter().collect();
            assert_eq!(received.len(), 3, "{received:?}");
            assert!(matches!(received[0], WidgetMessage::Init(_)));
            assert!(matches!(received[1], WidgetMessage::Immersive(true)));
            assert!(matches!(received[2], WidgetMessage::ScriptChanged));
        }
    }

    #[test]
    fn test_activity_from_closed_widget_is_dropped() {
        let mut controller = controller();
        let (kept, kept_channels) =
            controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        let (gone, gone_channels) =
            controller.spawn_widget(WidgetSettings::default_for(WidgetKind::Image));
        kept_channels.reader.send(ReaderMessage::Activity(kept.id)).unwrap();
        gone_channels.reader.send(ReaderMessage::Activity(gone.id)).unwrap();
        controller.close_widget(gone.id);

        assert_eq!(
            controller.poll_reader_messages(),
            vec![ReaderMessage::Activity(kept.id)]
        );
    }

    #[test]
    fn test_new_document_resets_position() {
        let mut controller = controller();
        controller.on_scroll(Span::new(120.0, 100.0), &spans());
        controller.set_document(Document::from_text(PathBuf::from("/doc/other.txt"), "x"));
        assert_eq!(controller.state().current_line_number, 0);
        assert_eq!(
            controller.state().document_path.as_deref(),
            Some(Path::new("/doc/other.txt"))
        );
    }
}
