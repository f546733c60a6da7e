//! Selection gates
//!
//! A gate is a pluggable veto policy consulted before any add or
//! preselect commits. At most one gate is active; installing a new gate
//! replaces the previous one, and the engine owns the installed gate.

use crate::resolve::ResolveMode;
use std::sync::Arc;

/// Veto policy for pending selection operations.
///
/// `allow` is consulted with the reference resolved under the resolve
/// mode the gate was installed with. Implementations that want to
/// report a per-call reason keep it behind interior mutability and
/// surface it through `rejection_reason`.
pub trait SelectionGate: Send + Sync {
    /// Whether the reference may be selected or preselected.
    fn allow(&self, document: &str, object: &str, sub_element: &str) -> bool;

    /// Reason for the most recent rejection, for user-visible feedback.
    fn rejection_reason(&self) -> Option<String> {
        None
    }
}

/// The active gate together with the resolve mode it was installed with.
#[derive(Clone)]
pub(crate) struct InstalledGate {
    pub(crate) gate: Arc<dyn SelectionGate>,
    pub(crate) mode: ResolveMode,
}

impl std::fmt::Debug for InstalledGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledGate")
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DenyAll;

    impl SelectionGate for DenyAll {
        fn allow(&self, _document: &str, _object: &str, _sub_element: &str) -> bool {
            false
        }

        fn rejection_reason(&self) -> Option<String> {
            Some("nothing may be selected".to_string())
        }
    }

    #[test]
    fn gate_reports_reason() {
        let gate = DenyAll;
        assert!(!gate.allow("Doc1", "Box", "Face1"));
        assert_eq!(
            gate.rejection_reason().as_deref(),
            Some("nothing may be selected")
        );
    }
}
