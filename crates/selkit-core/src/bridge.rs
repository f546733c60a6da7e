//! Collaborator bridges to the host application
//!
//! The engine talks to the view layer, the host window, and the script
//! recorder only through the trait contracts below. Every method has a
//! no-op default so a host can implement exactly the surface it has;
//! all calls are fire-and-forget from the engine's point of view.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::model::PickPoint;

/// Bridge to the host's view-provider layer.
pub trait ViewBridge: Send + Sync {
    /// Populate the object's lazily-computed bounding-box cache.
    ///
    /// Called ahead of any renderer needing the geometry; the engine
    /// never blocks on the result.
    fn warm_bounding_box(&self, _document: &str, _object: &str, _sub_path: &str) {}

    /// Current visibility of the object, when the view layer knows it.
    fn is_visible(&self, _document: &str, _object: &str) -> Option<bool> {
        None
    }

    /// Show or hide the object.
    fn set_visible(&self, _document: &str, _object: &str, _visible: bool) {}
}

/// Bridge to the host window's transient feedback surfaces.
pub trait HostSurface: Send + Sync {
    /// Push text to the status line.
    fn show_status(&self, _text: &str) {}

    /// Show a floating tooltip near the given pick location.
    fn show_tooltip(&self, _text: &str, _at: Option<PickPoint>) {}

    /// Hide the floating tooltip.
    fn hide_tooltip(&self) {}

    /// Audible rejection cue.
    fn beep(&self) {}

    /// Override the pointer with the "forbidden" cursor.
    fn set_forbidden_cursor(&self) {}

    /// Restore the pointer to its normal cursor.
    fn restore_cursor(&self) {}
}

/// Append-only sink for replayable script lines.
///
/// Every committed selection mutation is mirrored here so a session can
/// be replayed; the engine suppresses emission under its logging guard.
pub trait ReplayLog: Send + Sync {
    /// Append one replay line.
    fn append_line(&self, line: &str);
}

/// View bridge that ignores every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullViewBridge;

impl ViewBridge for NullViewBridge {}

/// Host surface that ignores every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl HostSurface for NullHost {}

/// Replay sink that drops every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReplayLog;

impl ReplayLog for NullReplayLog {
    fn append_line(&self, _line: &str) {}
}

/// Replay sink that buffers lines in memory for inspection or deferred
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryReplayLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryReplayLog {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the buffered lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    /// Whether no lines were recorded.
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Drop all buffered lines.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ReplayLog for MemoryReplayLog {
    fn append_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Replay sink that appends lines to a file.
///
/// Write failures are reported through `tracing` and otherwise ignored;
/// a broken replay file must never disturb the selection state machine.
pub struct FileReplayLog {
    writer: Mutex<BufWriter<File>>,
}

impl FileReplayLog {
    /// Create (truncating) the replay file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl ReplayLog for FileReplayLog {
    fn append_line(&self, line: &str) {
        let mut writer = self.writer.lock();
        if let Err(err) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            tracing::warn!("replay log write failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_buffers_in_order() {
        let log = MemoryReplayLog::new();
        assert!(log.is_empty());
        log.append_line("first");
        log.append_line("second");
        assert_eq!(log.len(), 2);
        assert_eq!(log.lines(), vec!["first", "second"]);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn file_log_writes_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("replay.log");
        let log = FileReplayLog::create(&path).expect("create log");
        log.append_line("add_selection(\"Doc1\", \"Box\", \"Face1\")");
        log.append_line("clear_selection(\"Doc1\")");

        let contents = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("add_selection"));
    }

    #[test]
    fn null_sinks_accept_calls() {
        NullReplayLog.append_line("ignored");
        NullHost.show_status("ignored");
        NullViewBridge.warm_bounding_box("Doc", "Box", "");
    }
}
