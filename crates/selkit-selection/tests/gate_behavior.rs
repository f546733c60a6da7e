//! Selection gate integration tests

mod common;

use std::sync::Arc;

use common::{demo_hub, origin, RecordingHost};
use selkit_selection::{
    DocumentModel, PreselectResult, PreselectSource, ResolveMode, SelectionGate, SelectionHub,
};
use std::sync::atomic::Ordering;

/// Rejects any reference to the named element.
struct ElementGate {
    banned: &'static str,
}

impl SelectionGate for ElementGate {
    fn allow(&self, _document: &str, _object: &str, sub_element: &str) -> bool {
        sub_element != self.banned
    }

    fn rejection_reason(&self) -> Option<String> {
        Some(format!("{} may not be selected", self.banned))
    }
}

/// Rejects objects of one type.
struct TypeGate {
    hub_model: Arc<selkit_selection::MemoryModel>,
    banned_type: &'static str,
}

impl SelectionGate for TypeGate {
    fn allow(&self, document: &str, object: &str, _sub_element: &str) -> bool {
        self.hub_model
            .object_type(document, object)
            .is_none_or(|t| t != self.banned_type)
    }
}

#[test]
fn gate_veto_is_deterministic() {
    let model = common::demo_model();
    let host = Arc::new(RecordingHost::default());
    let hub = SelectionHub::new(model.clone()).with_host(host.clone());

    hub.add_selection_gate(
        TypeGate {
            hub_model: model,
            banned_type: "Part::Box",
        },
        ResolveMode::OldStyleElement,
    );

    for _ in 0..3 {
        assert!(!hub.add_selection("Doc1", "Box", "Face1", origin(), None, false));
        assert!(!hub.has_selection(None));
    }
    assert_eq!(host.beeps.load(Ordering::SeqCst), 3);
    assert_eq!(host.statuses.lock().len(), 3);

    // A non-banned object still goes through.
    assert!(hub.add_selection("Doc1", "Cylinder", "Face1", origin(), None, false));
    assert_eq!(hub.selection(Some("Doc1"), ResolveMode::NoResolve).len(), 1);
}

#[test]
fn rejection_shows_reason_and_cursor() {
    let model = common::demo_model();
    let host = Arc::new(RecordingHost::default());
    let hub = SelectionHub::new(model).with_host(host.clone());

    hub.add_selection_gate(ElementGate { banned: "Edge3" }, ResolveMode::OldStyleElement);

    assert!(!hub.add_selection("Doc1", "Box", "Edge3", origin(), None, false));
    assert!(!hub.has_selection(None));
    assert_eq!(
        host.statuses.lock().last().map(String::as_str),
        Some("Edge3 may not be selected")
    );
    assert!(host.forbidden_cursor.load(Ordering::SeqCst));
    assert_eq!(host.beeps.load(Ordering::SeqCst), 1);

    // The cursor override is restored by the next un-preselect.
    hub.clear_preselection();
    assert!(!host.forbidden_cursor.load(Ordering::SeqCst));
}

#[test]
fn preselect_respects_the_gate() {
    let model = common::demo_model();
    let host = Arc::new(RecordingHost::default());
    let hub = SelectionHub::new(model).with_host(host.clone());

    hub.add_selection_gate(ElementGate { banned: "Edge3" }, ResolveMode::OldStyleElement);

    let status = hub.set_preselect(
        "Doc1",
        "Box",
        "Edge3",
        origin(),
        PreselectSource::External,
        true,
    );
    assert_eq!(status, PreselectResult::Rejected);
    assert!(!hub.has_preselection());
    assert!(host.forbidden_cursor.load(Ordering::SeqCst));
    // Hover rejection gives no audible cue.
    assert_eq!(host.beeps.load(Ordering::SeqCst), 0);

    // A trusted internal request bypasses the gate.
    let status = hub.set_preselect(
        "Doc1",
        "Box",
        "Edge3",
        origin(),
        PreselectSource::Internal,
        false,
    );
    assert_eq!(status, PreselectResult::Accepted);
    assert!(hub.has_preselection());
}

#[test]
fn replacing_and_removing_the_gate() {
    let (_, hub) = demo_hub();

    hub.add_selection_gate(ElementGate { banned: "Face1" }, ResolveMode::OldStyleElement);
    assert!(!hub.add_selection("Doc1", "Box", "Face1", origin(), None, false));

    // Installing a new gate implicitly uninstalls the previous one.
    hub.add_selection_gate(ElementGate { banned: "Face2" }, ResolveMode::OldStyleElement);
    assert!(hub.add_selection("Doc1", "Box", "Face1", origin(), None, false));
    assert!(!hub.add_selection("Doc1", "Box", "Face2", origin(), None, false));

    hub.remove_selection_gate();
    assert!(!hub.has_selection_gate());
    assert!(hub.add_selection("Doc1", "Box", "Face2", origin(), None, false));
}

#[test]
fn generic_reason_when_gate_gives_none() {
    let model = common::demo_model();
    let host = Arc::new(RecordingHost::default());
    let hub = SelectionHub::new(model.clone()).with_host(host.clone());

    hub.add_selection_gate(
        TypeGate {
            hub_model: model,
            banned_type: "Part::Box",
        },
        ResolveMode::OldStyleElement,
    );

    assert!(!hub.add_selection("Doc1", "Box", "", origin(), None, false));
    assert_eq!(
        host.statuses.lock().last().map(String::as_str),
        Some("Selection not allowed by filter")
    );
}
