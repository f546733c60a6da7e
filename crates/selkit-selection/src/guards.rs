//! RAII scope guards
//!
//! The engine's suppression switches are nestable counters that must be
//! released on every exit path, including unwinding. Each guard bumps
//! its counter on construction and releases it on drop; guards nest in
//! strict LIFO order within a call stack.

use crate::hub::SelectionHub;

/// Defers notification draining for the guard's lifetime.
///
/// Changes keep accumulating (and coalescing) on the queue; when the
/// outermost guard drops, exactly one coalesced drain is flushed and a
/// history snapshot is pushed.
#[must_use = "notifications resume when the guard is dropped"]
pub struct NotificationPauseGuard<'a> {
    pub(crate) hub: &'a SelectionHub,
}

impl Drop for NotificationPauseGuard<'_> {
    fn drop(&mut self) {
        self.hub.resume_notifications();
    }
}

/// Suppresses replay-line emission for the guard's lifetime.
#[must_use = "replay logging resumes when the guard is dropped"]
pub struct ReplayLogPauseGuard<'a> {
    pub(crate) hub: &'a SelectionHub,
}

impl Drop for ReplayLogPauseGuard<'_> {
    fn drop(&mut self) {
        self.hub.resume_replay_log();
    }
}

/// Suppresses the top-parent rewrite of raw references for the guard's
/// lifetime.
#[must_use = "the top-parent check resumes when the guard is dropped"]
pub struct TopParentCheckGuard<'a> {
    pub(crate) hub: &'a SelectionHub,
}

impl Drop for TopParentCheckGuard<'_> {
    fn drop(&mut self) {
        self.hub.resume_top_parent_check();
    }
}
