//! Status text formatting
//!
//! Builds the human-readable hover/selection description shown in the
//! host status line: resolved object name with element suffix, label
//! when it differs from the internal name, unit-aware pick coordinates,
//! and the fully-qualified reference.

use selkit_core::{format_length, format_length_raw, unit_label, DocumentModel, SelectionConfig};

use crate::record::SelectionRecord;

/// Format the status-line description for a record.
///
/// With `raw`, coordinates are printed at raw precision in model units
/// instead of the configured measurement system (the precision modifier
/// key in the host).
pub fn format_status(
    model: &dyn DocumentModel,
    config: &SelectionConfig,
    record: &SelectionRecord,
    raw: bool,
) -> String {
    let display_object = record
        .resolved_object
        .as_deref()
        .unwrap_or(record.object.as_str());

    let mut text = String::new();
    text.push_str(display_object);
    if !record.element.old_style.is_empty() {
        text.push('.');
        text.push_str(&record.element.old_style);
    }

    if let Some(label) = model.object_label(&record.document, display_object) {
        if label != display_object {
            text.push_str(&format!(" ({})", label));
        }
    }

    let pick = record.pick;
    let coords = if raw {
        let d = config.raw_decimals;
        format!(
            "{}, {}, {}",
            format_length_raw(pick.x, d),
            format_length_raw(pick.y, d),
            format_length_raw(pick.z, d)
        )
    } else {
        let system = config.measurement_system;
        let unit = unit_label(system);
        format!(
            "{} {}, {} {}, {} {}",
            format_length(pick.x, system),
            unit,
            format_length(pick.y, system),
            unit,
            format_length(pick.z, system),
            unit
        )
    };
    text.push_str(&format!(" [{}]", coords));

    text.push_str(&format!(" {}", record.reference()));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ElementName;
    use selkit_core::{MeasurementSystem, MemoryModel, PickPoint};

    fn record() -> SelectionRecord {
        let mut rec = SelectionRecord::new("Doc1", "Box", "Face1");
        rec.resolved_object = Some("Box".to_string());
        rec.element = ElementName {
            new_style: ";Face1".to_string(),
            old_style: "Face1".to_string(),
        };
        rec.pick = PickPoint::new(10.0, 5.0, 0.0);
        rec
    }

    #[test]
    fn metric_status_line() {
        let model = MemoryModel::new();
        model.add_object("Doc1", "Box", "Part::Box");
        let config = SelectionConfig::default();

        let text = format_status(&model, &config, &record(), false);
        assert_eq!(
            text,
            "Box.Face1 [10.000 mm, 5.000 mm, 0.000 mm] Doc1#Box.Face1"
        );
    }

    #[test]
    fn label_shown_when_distinct() {
        let model = MemoryModel::new();
        model.add_object("Doc1", "Box", "Part::Box");
        model.set_label("Doc1", "Box", "Housing");
        let config = SelectionConfig::default();

        let text = format_status(&model, &config, &record(), false);
        assert!(text.starts_with("Box.Face1 (Housing) ["));
    }

    #[test]
    fn imperial_and_raw_coordinates() {
        let model = MemoryModel::new();
        model.add_object("Doc1", "Box", "Part::Box");
        let config = SelectionConfig {
            measurement_system: MeasurementSystem::Imperial,
            ..SelectionConfig::default()
        };

        let mut rec = record();
        rec.pick = PickPoint::new(25.4, 0.0, 0.0);
        let text = format_status(&model, &config, &rec, false);
        assert!(text.contains("[1.000 in, 0.000 in, 0.000 in]"));

        let text = format_status(&model, &config, &rec, true);
        assert!(text.contains("[25.400000, 0.000000, 0.000000]"));
    }

    #[test]
    fn whole_object_has_no_element_suffix() {
        let model = MemoryModel::new();
        model.add_object("Doc1", "Box", "Part::Box");
        let config = SelectionConfig::default();

        let mut rec = SelectionRecord::new("Doc1", "Box", "");
        rec.resolved_object = Some("Box".to_string());
        let text = format_status(&model, &config, &rec, false);
        assert!(text.starts_with("Box ["));
        assert!(text.ends_with("Doc1#Box"));
    }
}
