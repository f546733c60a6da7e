//! Change message definitions for the notification router.
//!
//! Messages are cloneable and serializable for logging/replay, carry a
//! category for observer filtering, and know their document scope so
//! the coalescing rules can decide which queued entries a clear/resync
//! makes moot.

use serde::{Deserialize, Serialize};

use crate::record::SelectionRef;
use selkit_core::PickPoint;

/// One change to selection or preselection state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionChange {
    /// A reference was added to the selection.
    Added {
        /// The reference that was selected.
        item: SelectionRef,
        /// Pick location of the add; zero when not a geometric pick.
        pick: PickPoint,
    },
    /// A reference was removed from the selection.
    Removed {
        /// The reference that was deselected.
        item: SelectionRef,
    },
    /// Too many incremental changes; observers should re-scan the whole
    /// selection instead of tracking deltas.
    Replaced {
        /// Scope of the resync, or `None` for all documents.
        document: Option<String>,
    },
    /// The selection was cleared.
    Cleared {
        /// Scope of the clear, or `None` for all documents.
        document: Option<String>,
    },
    /// A reference became the hovered preselection.
    PreselectSet {
        /// The hovered reference.
        item: SelectionRef,
        /// Hover location.
        pick: PickPoint,
    },
    /// The hovered preselection went away.
    PreselectCleared,
    /// Visibility of a selected reference was toggled without changing
    /// membership.
    VisibilityTouched {
        /// The reference whose view state changed.
        item: SelectionRef,
        /// The new visibility.
        visible: bool,
    },
    /// The picked-candidates list was replaced.
    PickedListChanged,
}

impl SelectionChange {
    /// Get the category of this change
    pub fn kind(&self) -> ChangeKind {
        match self {
            SelectionChange::Added { .. } => ChangeKind::Added,
            SelectionChange::Removed { .. } => ChangeKind::Removed,
            SelectionChange::Replaced { .. } => ChangeKind::Replaced,
            SelectionChange::Cleared { .. } => ChangeKind::Cleared,
            SelectionChange::PreselectSet { .. } => ChangeKind::PreselectSet,
            SelectionChange::PreselectCleared => ChangeKind::PreselectCleared,
            SelectionChange::VisibilityTouched { .. } => ChangeKind::Visibility,
            SelectionChange::PickedListChanged => ChangeKind::PickedList,
        }
    }

    /// Document the change is scoped to; `None` means all documents.
    pub fn document_scope(&self) -> Option<&str> {
        match self {
            SelectionChange::Added { item, .. }
            | SelectionChange::Removed { item }
            | SelectionChange::PreselectSet { item, .. }
            | SelectionChange::VisibilityTouched { item, .. } => Some(item.document.as_str()),
            SelectionChange::Replaced { document } | SelectionChange::Cleared { document } => {
                document.as_deref()
            }
            SelectionChange::PreselectCleared | SelectionChange::PickedListChanged => None,
        }
    }

    /// Whether this is an incremental membership change that the
    /// collapse counter tracks.
    pub(crate) fn is_incremental(&self) -> bool {
        matches!(
            self,
            SelectionChange::Added { .. } | SelectionChange::Removed { .. }
        )
    }

    /// Whether a clear/resync message scoped to `scope` makes this
    /// queued entry moot.
    pub(crate) fn superseded_by_scope(&self, scope: Option<&str>) -> bool {
        let affected = matches!(
            self.kind(),
            ChangeKind::Added | ChangeKind::Removed | ChangeKind::Cleared | ChangeKind::Replaced
        );
        if !affected {
            return false;
        }
        match scope {
            None => true,
            Some(doc) => self.document_scope() == Some(doc),
        }
    }

    /// Get a short description of this change for logging
    pub fn description(&self) -> String {
        match self {
            SelectionChange::Added { item, .. } => format!("Added {}", item),
            SelectionChange::Removed { item } => format!("Removed {}", item),
            SelectionChange::Replaced { document } => match document {
                Some(doc) => format!("Resync selection in {}", doc),
                None => "Resync selection".to_string(),
            },
            SelectionChange::Cleared { document } => match document {
                Some(doc) => format!("Cleared selection in {}", doc),
                None => "Cleared selection".to_string(),
            },
            SelectionChange::PreselectSet { item, .. } => format!("Preselect {}", item),
            SelectionChange::PreselectCleared => "Preselect cleared".to_string(),
            SelectionChange::VisibilityTouched { item, visible } => {
                format!("Visibility of {} -> {}", item, visible)
            }
            SelectionChange::PickedListChanged => "Picked list changed".to_string(),
        }
    }
}

/// Change category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Reference added to the selection.
    Added,
    /// Reference removed from the selection.
    Removed,
    /// Full-resync collapse message.
    Replaced,
    /// Selection cleared.
    Cleared,
    /// Preselection set.
    PreselectSet,
    /// Preselection cleared.
    PreselectCleared,
    /// Visibility-only change.
    Visibility,
    /// Picked-candidates list replaced.
    PickedList,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Removed => write!(f, "Removed"),
            ChangeKind::Replaced => write!(f, "Replaced"),
            ChangeKind::Cleared => write!(f, "Cleared"),
            ChangeKind::PreselectSet => write!(f, "PreselectSet"),
            ChangeKind::PreselectCleared => write!(f, "PreselectCleared"),
            ChangeKind::Visibility => write!(f, "Visibility"),
            ChangeKind::PickedList => write!(f, "PickedList"),
        }
    }
}

/// Filter to receive only specific change kinds
#[derive(Debug, Clone, Default)]
pub enum ChangeFilter {
    /// Receive all changes.
    #[default]
    All,
    /// Receive changes matching any of these kinds.
    Kinds(Vec<ChangeKind>),
}

impl ChangeFilter {
    /// Check if a change matches this filter
    pub fn matches(&self, change: &SelectionChange) -> bool {
        match self {
            ChangeFilter::All => true,
            ChangeFilter::Kinds(kinds) => kinds.contains(&change.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(doc: &str) -> SelectionChange {
        SelectionChange::Added {
            item: SelectionRef::new(doc, "Box", "Face1"),
            pick: PickPoint::zero(),
        }
    }

    #[test]
    fn kinds_and_scopes() {
        assert_eq!(added("Doc1").kind(), ChangeKind::Added);
        assert_eq!(added("Doc1").document_scope(), Some("Doc1"));
        assert_eq!(
            SelectionChange::Cleared { document: None }.document_scope(),
            None
        );
        assert_eq!(SelectionChange::PreselectCleared.document_scope(), None);
    }

    #[test]
    fn scoped_supersession() {
        let msg = added("Doc1");
        assert!(msg.superseded_by_scope(None));
        assert!(msg.superseded_by_scope(Some("Doc1")));
        assert!(!msg.superseded_by_scope(Some("Doc2")));
        assert!(!SelectionChange::PickedListChanged.superseded_by_scope(None));
        assert!(!SelectionChange::PreselectCleared.superseded_by_scope(None));
    }

    #[test]
    fn filter_matches() {
        let msg = added("Doc1");
        assert!(ChangeFilter::All.matches(&msg));
        assert!(ChangeFilter::Kinds(vec![ChangeKind::Added]).matches(&msg));
        assert!(!ChangeFilter::Kinds(vec![ChangeKind::Cleared]).matches(&msg));
        assert!(
            ChangeFilter::Kinds(vec![ChangeKind::Cleared, ChangeKind::Added]).matches(&msg)
        );
    }

    #[test]
    fn change_round_trips_through_serde() {
        let msg = added("Doc1");
        let json = serde_json::to_string(&msg).expect("serialize");
        let back: SelectionChange = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, msg);
    }
}
