use anyhow::{Context, Result};
use notify_debouncer_mini::notify::{self, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use crate::sync::script;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches the image script of an open document for edits.
pub struct ScriptWatcher {
    script_path: PathBuf,
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    rx: Receiver<DebounceEventResult>,
}

impl ScriptWatcher {
    /// Start watching the script directory next to `document`.
    ///
    /// Returns `Ok(None)` when the document has no script directory to watch.
    pub fn start(document: &Path) -> Result<Option<Self>> {
        let Some(script_path) = script::script_path_for(document) else {
            return Ok(None);
        };
        let Some(dir) = script_path.parent().filter(|d| d.is_dir()) else {
            log::debug!("No script directory for {}", document.display());
            return Ok(None);
        };

        let (tx, rx) = mpsc::channel();
        let mut debouncer =
            new_debouncer(DEBOUNCE, tx).context("Failed to create file watcher")?;
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        log::info!("Watching {}", dir.display());
        Ok(Some(Self {
            script_path,
            _debouncer: debouncer,
            rx,
        }))
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Drain pending events. Returns true if the watched script was touched.
    pub fn changed(&self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(events) => {
                    changed |= events.iter().any(|event| {
                        event.kind == DebouncedEventKind::Any
                            && same_file_name(&event.path, &self.script_path)
                    });
                }
                Err(e) => log::warn!("Script watcher error: {e}"),
            }
        }
        changed
    }
}

// Event paths may be canonicalized differently from ours, so compare names only.
fn same_file_name(a: &Path, b: &Path) -> bool {
    a.file_name().is_some() && a.file_name() == b.file_name()
}
