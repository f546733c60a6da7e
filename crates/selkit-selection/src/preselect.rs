//! Preselection state
//!
//! At most one reference is "hovered" at a time, independent of the
//! committed selection. The state also remembers a gate rejection so
//! the cursor override can be restored on the next un-preselect, and
//! carries the free-text preselection message consumers may install
//! for the tooltip.

use crate::record::{SelectionRecord, SelectionRef};
use selkit_core::PickPoint;

/// Outcome of a preselect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreselectResult {
    /// Same reference was already hovered; only the coordinates were
    /// updated, no notification was emitted.
    Unchanged,
    /// Nothing happened: same reference and same coordinates, or the
    /// reference did not resolve.
    Ignored,
    /// The active gate vetoed the reference.
    Rejected,
    /// The reference became the new preselection.
    Accepted,
}

/// Origin of a preselect request.
///
/// Internal requests (stack restoration, tree view sync) are trusted
/// and bypass the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreselectSource {
    /// A pick or hover coming from outside the engine.
    #[default]
    External,
    /// A trusted request from inside the engine or its host.
    Internal,
}

/// The single hovered record plus its presentation state.
#[derive(Debug, Default)]
pub struct PreselectionState {
    current: Option<SelectionRecord>,
    /// Formatted status text for the current hover.
    status_text: String,
    /// Free-text message shown as the hover tooltip when non-empty.
    message: String,
    /// Reference recorded on gate rejection; the cursor override is
    /// still active and must be restored on the next un-preselect.
    rejected: Option<SelectionRef>,
}

impl PreselectionState {
    /// The hovered record, if any.
    pub fn current(&self) -> Option<&SelectionRecord> {
        self.current.as_ref()
    }

    /// Whether the reference is the hovered one.
    pub fn is_current(&self, reference: &SelectionRef) -> bool {
        self.current
            .as_ref()
            .is_some_and(|rec| rec.reference() == *reference)
    }

    /// Install a new hovered record.
    pub fn set(&mut self, record: SelectionRecord) {
        self.current = Some(record);
        self.rejected = None;
    }

    /// Update only the hover coordinates.
    pub fn set_coords(&mut self, pick: PickPoint) {
        if let Some(rec) = self.current.as_mut() {
            rec.pick = pick;
        }
    }

    /// Record a gate rejection so the cursor restore has a referent.
    pub fn set_rejected(&mut self, reference: SelectionRef) {
        self.rejected = Some(reference);
    }

    /// Whether a rejection cursor override is outstanding.
    pub fn has_rejection(&self) -> bool {
        self.rejected.is_some()
    }

    /// Formatted status text for the current hover.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Replace the formatted status text.
    pub fn set_status_text(&mut self, text: String) {
        self.status_text = text;
    }

    /// The free-text preselection message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the free-text preselection message.
    pub fn set_message(&mut self, text: String) {
        self.message = text;
    }

    /// Drop all hover state, returning the record that was hovered.
    pub fn clear(&mut self) -> Option<SelectionRecord> {
        self.rejected = None;
        self.status_text.clear();
        self.message.clear();
        self.current.take()
    }

    /// Whether anything is hovered or pending a cursor restore.
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.rejected.is_none()
    }
}
