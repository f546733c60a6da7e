//! Shared fixtures for the selection engine integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use selkit_selection::{
    ChangeFilter, ChangeKind, HostSurface, MemoryModel, PickPoint, SelectionChange, SelectionHub,
    ViewBridge,
};

/// Two documents with a handful of typed objects and elements.
pub fn demo_model() -> Arc<MemoryModel> {
    let model = MemoryModel::new();
    model.add_document("Doc1");
    model.add_object("Doc1", "Box", "Part::Box");
    for element in ["Face1", "Face2", "Face3", "Edge3"] {
        model.add_element("Doc1", "Box", element);
    }
    model.add_object("Doc1", "Cylinder", "Part::Cylinder");
    model.add_element("Doc1", "Cylinder", "Face1");
    model.add_element("Doc1", "Cylinder", "Face2");

    model.add_document("Doc2");
    model.add_object("Doc2", "Sketch", "Sketcher::Sketch");
    model.add_element("Doc2", "Sketch", "Edge1");
    Arc::new(model)
}

/// Hub over the demo model with no-op bridges.
pub fn demo_hub() -> (Arc<MemoryModel>, SelectionHub) {
    let model = demo_model();
    let hub = SelectionHub::new(model.clone());
    (model, hub)
}

/// Host surface that records every feedback call.
#[derive(Default)]
pub struct RecordingHost {
    pub statuses: Mutex<Vec<String>>,
    pub tooltips: Mutex<Vec<String>>,
    pub tooltips_hidden: AtomicUsize,
    pub beeps: AtomicUsize,
    pub forbidden_cursor: AtomicBool,
}

impl HostSurface for RecordingHost {
    fn show_status(&self, text: &str) {
        self.statuses.lock().push(text.to_string());
    }

    fn show_tooltip(&self, text: &str, _at: Option<PickPoint>) {
        self.tooltips.lock().push(text.to_string());
    }

    fn hide_tooltip(&self) {
        self.tooltips_hidden.fetch_add(1, Ordering::SeqCst);
    }

    fn beep(&self) {
        self.beeps.fetch_add(1, Ordering::SeqCst);
    }

    fn set_forbidden_cursor(&self) {
        self.forbidden_cursor.store(true, Ordering::SeqCst);
    }

    fn restore_cursor(&self) {
        self.forbidden_cursor.store(false, Ordering::SeqCst);
    }
}

/// View bridge that records warm-ups and tracks visibility flags.
#[derive(Default)]
pub struct RecordingViewBridge {
    pub warmed: Mutex<Vec<(String, String, String)>>,
    pub visibility: Mutex<HashMap<(String, String), bool>>,
}

impl ViewBridge for RecordingViewBridge {
    fn warm_bounding_box(&self, document: &str, object: &str, sub_path: &str) {
        self.warmed
            .lock()
            .push((document.to_string(), object.to_string(), sub_path.to_string()));
    }

    fn is_visible(&self, document: &str, object: &str) -> Option<bool> {
        self.visibility
            .lock()
            .get(&(document.to_string(), object.to_string()))
            .copied()
    }

    fn set_visible(&self, document: &str, object: &str, visible: bool) {
        self.visibility
            .lock()
            .insert((document.to_string(), object.to_string()), visible);
    }
}

/// Subscribe a collector for all changes; returns the shared log.
pub fn collect_changes(hub: &SelectionHub) -> Arc<Mutex<Vec<SelectionChange>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    hub.subscribe(ChangeFilter::All, move |change| {
        sink.lock().push(change.clone());
        Ok(())
    });
    log
}

/// Kinds of the collected changes, in delivery order.
pub fn kinds(log: &Arc<Mutex<Vec<SelectionChange>>>) -> Vec<ChangeKind> {
    log.lock().iter().map(|c| c.kind()).collect()
}

/// Shorthand for an origin pick.
pub fn origin() -> PickPoint {
    PickPoint::zero()
}

/// Surface engine diagnostics in test output; safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
