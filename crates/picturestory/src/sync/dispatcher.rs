use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use super::message::{PositionUpdate, ReaderMessage, WidgetId, WidgetMessage};

/// Address of a widget window's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(u64);

/// A live widget, as tracked by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetRef {
    pub id: WidgetId,
    pub window: WindowHandle,
}

/// Widgets in spawn order. Each entry is removed exactly once, when its window closes.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    entries: Vec<WidgetRef>,
}

impl WidgetRegistry {
    pub fn insert(&mut self, widget: WidgetRef) {
        if !self.contains(widget.id) {
            self.entries.push(widget);
        }
    }

    /// Remove a widget. Returns `None` if it was already removed.
    pub fn remove(&mut self, id: WidgetId) -> Option<WidgetRef> {
        let index = self.entries.iter().position(|w| w.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.entries.iter().any(|w| w.id == id)
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetRef> {
        self.entries.iter().find(|w| w.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WidgetRef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both ends a widget window needs: its inbox and a way back to the reader.
#[derive(Debug)]
pub struct WidgetChannels {
    pub inbox: Receiver<WidgetMessage>,
    pub reader: Sender<ReaderMessage>,
}

/// Fire-and-forget delivery between the reader and widget windows.
///
/// Every window gets its own FIFO channel. Sending never blocks and never fails
/// loudly: a closed or unknown window is skipped.
#[derive(Debug)]
pub struct Dispatcher {
    next_window: u64,
    outboxes: HashMap<WindowHandle, Sender<WidgetMessage>>,
    reader_tx: Sender<ReaderMessage>,
    reader_rx: Receiver<ReaderMessage>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (reader_tx, reader_rx) = mpsc::channel();
        Self {
            next_window: 0,
            outboxes: HashMap::new(),
            reader_tx,
            reader_rx,
        }
    }

    pub fn open_window(&mut self) -> (WindowHandle, WidgetChannels) {
        self.next_window += 1;
        let handle = WindowHandle(self.next_window);
        let (tx, inbox) = mpsc::channel();
        self.outboxes.insert(handle, tx);
        let channels = WidgetChannels {
            inbox,
            reader: self.reader_tx.clone(),
        };
        (handle, channels)
    }

    /// Drop a window's outbox. Returns false if it was already closed.
    pub fn close_window(&mut self, window: WindowHandle) -> bool {
        self.outboxes.remove(&window).is_some()
    }

    pub fn is_open(&self, window: WindowHandle) -> bool {
        self.outboxes.contains_key(&window)
    }

    /// Send one message. Returns whether it was handed to a live inbox.
    pub fn send(&self, window: WindowHandle, message: WidgetMessage) -> bool {
        match self.outboxes.get(&window) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Send a message to each widget. Returns how many were delivered.
    pub fn broadcast<'a>(
        &self,
        widgets: impl IntoIterator<Item = &'a WidgetRef>,
        message: &WidgetMessage,
    ) -> usize {
        widgets
            .into_iter()
            .filter(|w| {
                let delivered = self.send(w.window, message.clone());
                if !delivered {
                    log::debug!("Skipping closed window for {}", w.id);
                }
                delivered
            })
            .count()
    }

    pub fn publish_position<'a>(
        &self,
        update: &PositionUpdate,
        widgets: impl IntoIterator<Item = &'a WidgetRef>,
    ) -> usize {
        let delivered = self.broadcast(widgets, &WidgetMessage::Position(update.clone()));
        log::trace!(
            "Line {} published to {delivered} widget(s)",
            update.line_number
        );
        delivered
    }

    /// Messages widgets sent back since the last call.
    pub fn drain_reader_messages(&self) -> Vec<ReaderMessage> {
        self.reader_rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn update(line: usize) -> PositionUpdate {
        PositionUpdate {
            line_number: line,
            document_path: Some(PathBuf::from("/doc/book.txt")),
        }
    }

    fn positions(channels: &WidgetChannels) -> Vec<usize> {
        channels
            .inbox
            .try_iter()
            .filter_map(|m| match m {
                WidgetMessage::Position(p) => Some(p.line_number),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_publish_reaches_every_widget() {
        let mut dispatcher = Dispatcher::new();
        let mut registry = WidgetRegistry::default();
        let (w1, c1) = dispatcher.open_window();
        let (w2, c2) = dispatcher.open_window();
        registry.insert(WidgetRef { id: WidgetId(1), window: w1 });
        registry.insert(WidgetRef { id: WidgetId(2), window: w2 });

        assert_eq!(dispatcher.publish_position(&update(7), registry.iter()), 2);
        assert_eq!(positions(&c1), vec![7]);
        assert_eq!(positions(&c2), vec![7]);
    }

    #[test]
    fn test_messages_arrive_in_order() {
        let mut dispatcher = Dispatcher::new();
        let (window, channels) = dispatcher.open_window();
        let widgets = [WidgetRef { id: WidgetId(1), window }];
        for line in [3, 4, 4, 9] {
            dispatcher.publish_position(&update(line), widgets.iter());
        }
        assert_eq!(positions(&channels), vec![3, 4, 4, 9]);
    }

    #[test]
    fn test_closed_window_skipped() {
        let mut dispatcher = Dispatcher::new();
        let (w1, c1) = dispatcher.open_window();
        let (w2, _c2) = dispatcher.open_window();
        let widgets = [
            WidgetRef { id: WidgetId(1), window: w1 },
            WidgetRef { id: WidgetId(2), window: w2 },
        ];
        assert!(dispatcher.close_window(w2));
        assert!(!dispatcher.is_open(w2));

        assert_eq!(dispatcher.publish_position(&update(1), widgets.iter()), 1);
        assert_eq!(positions(&c1), vec![1]);
    }

    #[test]
    fn test_dropped_receiver_skipped() {
        let mut dispatcher = Dispatcher::new();
        let (window, channels) = dispatcher.open_window();
        drop(channels);
        let widgets = [WidgetRef { id: WidgetId(1), window }];
        assert_eq!(dispatcher.publish_position(&update(1), widgets.iter()), 0);
    }

    #[test]
    fn test_close_window_once() {
        let mut dispatcher = Dispatcher::new();
        let (window, _channels) = dispatcher.open_window();
        assert!(dispatcher.close_window(window));
        assert!(!dispatcher.close_window(window));
    }

    #[test]
    fn test_registry_removes_exactly_once() {
        let mut dispatcher = Dispatcher::new();
        let (window, _channels) = dispatcher.open_window();
        let mut registry = WidgetRegistry::default();
        let widget = WidgetRef { id: WidgetId(4), window };
        registry.insert(widget);
        registry.insert(widget);
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.remove(WidgetId(4)), Some(widget));
        assert_eq!(registry.remove(WidgetId(4)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reader_back_channel() {
        let mut dispatcher = Dispatcher::new();
        let (_window, channels) = dispatcher.open_window();
        channels.reader.send(ReaderMessage::Activity(WidgetId(3))).unwrap();
        channels.reader.send(ReaderMessage::Activity(WidgetId(3))).unwrap();
        assert_eq!(
            dispatcher.drain_reader_messages(),
            vec![
                ReaderMessage::Activity(WidgetId(3)),
                ReaderMessage::Activity(WidgetId(3))
            ]
        );
        assert!(dispatcher.drain_reader_messages().is_empty());
    }
}
