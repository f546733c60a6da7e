//! Preselection status and tooltip integration tests

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{demo_model, RecordingHost};
use selkit_selection::{
    MeasurementSystem, PickPoint, PreselectSource, SelectionConfig, SelectionHub,
};

fn display_hub() -> (Arc<RecordingHost>, SelectionHub) {
    let host = Arc::new(RecordingHost::default());
    let model = demo_model();
    model.set_label("Doc1", "Box", "Housing");
    let hub = SelectionHub::new(model).with_host(host.clone());
    (host, hub)
}

#[test]
fn hover_pushes_formatted_status_text() {
    let (host, hub) = display_hub();

    hub.set_preselect(
        "Doc1",
        "Box",
        "Face1",
        PickPoint::new(10.0, 5.0, 0.0),
        PreselectSource::External,
        true,
    );

    let statuses = host.statuses.lock().clone();
    assert_eq!(statuses.len(), 1);
    assert_eq!(
        statuses[0],
        "Box.Face1 (Housing) [10.000 mm, 5.000 mm, 0.000 mm] Doc1#Box.Face1"
    );
    assert_eq!(hub.preselection_status_text(), statuses[0]);
}

#[test]
fn coordinate_motion_refreshes_the_status() {
    let (host, hub) = display_hub();

    hub.set_preselect(
        "Doc1",
        "Box",
        "Face1",
        PickPoint::new(1.0, 0.0, 0.0),
        PreselectSource::External,
        true,
    );
    hub.set_preselect_coord(PickPoint::new(2.0, 0.0, 0.0));

    let statuses = host.statuses.lock().clone();
    assert_eq!(statuses.len(), 2);
    assert!(statuses[1].contains("[2.000 mm"));
}

#[test]
fn imperial_units_flow_into_the_status() {
    let host = Arc::new(RecordingHost::default());
    let config = SelectionConfig {
        measurement_system: MeasurementSystem::Imperial,
        ..SelectionConfig::default()
    };
    let hub = SelectionHub::with_config(demo_model(), config).with_host(host.clone());

    hub.set_preselect(
        "Doc1",
        "Box",
        "Face1",
        PickPoint::new(25.4, 0.0, 0.0),
        PreselectSource::External,
        true,
    );
    assert!(host.statuses.lock()[0].contains("[1.000 in, 0.000 in, 0.000 in]"));
}

#[test]
fn tooltip_follows_the_preselection_message() {
    let (host, hub) = display_hub();

    hub.set_preselect(
        "Doc1",
        "Box",
        "Face1",
        PickPoint::zero(),
        PreselectSource::External,
        true,
    );
    // No message installed: the tooltip stays hidden.
    assert!(host.tooltips.lock().is_empty());
    assert!(host.tooltips_hidden.load(Ordering::SeqCst) > 0);

    // A consumer installs hover text; the tooltip shows immediately.
    hub.set_preselection_text("Face1 of the housing");
    assert_eq!(
        host.tooltips.lock().last().map(String::as_str),
        Some("Face1 of the housing")
    );
    assert_eq!(hub.preselection_text(), "Face1 of the housing");

    // Un-preselecting hides it again and drops the message.
    hub.clear_preselection();
    assert!(hub.preselection_text().is_empty());
}

#[test]
fn hover_state_machine_results() {
    let (_, hub) = display_hub();

    // Unresolvable hover is ignored outright.
    let status = hub.set_preselect(
        "Doc1",
        "Missing",
        "",
        PickPoint::zero(),
        PreselectSource::External,
        false,
    );
    assert_eq!(status, selkit_selection::PreselectResult::Ignored);
    assert!(!hub.has_preselection());

    // Hovering something else replaces the previous hover.
    hub.set_preselect(
        "Doc1",
        "Box",
        "Face1",
        PickPoint::zero(),
        PreselectSource::External,
        false,
    );
    hub.set_preselect(
        "Doc1",
        "Cylinder",
        "Face1",
        PickPoint::zero(),
        PreselectSource::External,
        false,
    );
    let current = hub.preselection().expect("hovered");
    assert_eq!(current.object, "Cylinder");
}
