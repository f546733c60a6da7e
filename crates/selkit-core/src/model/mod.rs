//! Document model contract
//!
//! The selection engine never owns document data. It consumes the host
//! application's document/object model through the [`DocumentModel`]
//! trait and refers to model entities exclusively by name keys, so a
//! deleted object can never leave a dangling pointer behind — staleness
//! is handled by explicit purge bookkeeping instead.
//!
//! Also provides the sub-element path grammar helpers shared by the
//! engine: a path is a `.`-separated chain of sub-object names, with an
//! optional trailing element name (`"Body.Pad.Face3"`). A path that ends
//! with `.` references a sub-object as a whole (`"Body.Pad."`), and the
//! empty path references the top-level object itself.

mod memory;

pub use memory::MemoryModel;

use serde::{Deserialize, Serialize};

/// A 3D pick location in model space (millimeters).
///
/// All-zero when the reference was not produced by a geometric pick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PickPoint {
    /// X coordinate in mm.
    pub x: f64,
    /// Y coordinate in mm.
    pub y: f64,
    /// Z coordinate in mm.
    pub z: f64,
}

impl PickPoint {
    /// Create a pick point from coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The non-pick origin value.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Outcome of resolving a sub-element path against the document model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedElement {
    /// The concrete target object the path lands on, after following links.
    pub object: String,
    /// Dynamic type identifier of the target object.
    pub type_name: String,
    /// Legacy indexed element name (e.g. `"Face1"`); empty for whole-object.
    pub old_name: String,
    /// Canonical mapped element name; empty for whole-object.
    pub new_name: String,
}

/// Read access to the host application's document/object model.
///
/// Implementations must answer by current model state on every call; the
/// engine re-validates references at use sites rather than caching
/// lookups.
pub trait DocumentModel: Send + Sync {
    /// Name of the currently active document, if any.
    fn active_document(&self) -> Option<String>;

    /// Whether a document with this name is open.
    fn has_document(&self, name: &str) -> bool;

    /// Whether the named object exists in the document.
    fn object_exists(&self, document: &str, object: &str) -> bool;

    /// Whether the object is mid-deletion and must not be referenced.
    fn is_pending_removal(&self, document: &str, object: &str) -> bool;

    /// Dynamic type identifier of the object.
    fn object_type(&self, document: &str, object: &str) -> Option<String>;

    /// User-visible label of the object, when it differs from the name.
    fn object_label(&self, document: &str, object: &str) -> Option<String>;

    /// Target of the object's link, following chains when `recurse`.
    ///
    /// Returns `None` for objects that are not links.
    fn linked_object(&self, document: &str, object: &str, recurse: bool) -> Option<String>;

    /// Resolve a sub-element path to a concrete object and canonical
    /// element names.
    ///
    /// With `allow_partial`, a path whose trailing element is unknown
    /// still resolves to the deepest reachable sub-object, with empty
    /// element names.
    fn resolve_element(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        allow_partial: bool,
    ) -> Option<ResolvedElement>;

    /// Walk up to the outermost container of `object` and rewrite the
    /// sub-element path relative to it.
    ///
    /// Returns the (top parent, rewritten path) pair; an object without a
    /// parent maps to itself with the path unchanged. `None` when the
    /// document or object is unknown.
    fn top_parent(&self, document: &str, object: &str, sub_element: &str)
        -> Option<(String, String)>;
}

/// Trailing element name of a sub-element path, if the path carries one.
///
/// `"Body.Pad.Face3"` yields `Some("Face3")`; `"Body.Pad."` and `""`
/// yield `None`.
pub fn element_name(sub_element: &str) -> Option<&str> {
    if sub_element.is_empty() || sub_element.ends_with('.') {
        return None;
    }
    match sub_element.rfind('.') {
        Some(pos) => Some(&sub_element[pos + 1..]),
        None => Some(sub_element),
    }
}

/// The sub-element path with its trailing element name removed.
///
/// The sub-object prefix keeps its trailing `.`: `"Body.Pad.Face3"`
/// yields `"Body.Pad."`, a bare `"Face3"` yields `""`.
pub fn strip_element(sub_element: &str) -> &str {
    match element_name(sub_element) {
        Some(elem) => &sub_element[..sub_element.len() - elem.len()],
        None => sub_element,
    }
}

/// Element-boundary-aware prefix test: is `sub_element` equal to or a
/// descendant of `parent`?
///
/// The empty parent path means "the whole object" and matches everything.
/// Boundaries are respected, so `"Pad2.Face1"` is NOT a descendant of
/// `"Pad"`.
pub fn is_descendant_path(sub_element: &str, parent: &str) -> bool {
    if parent.is_empty() || sub_element == parent {
        return true;
    }
    if !sub_element.starts_with(parent) {
        return false;
    }
    parent.ends_with('.') || sub_element.as_bytes()[parent.len()] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_name_of_plain_element() {
        assert_eq!(element_name("Face1"), Some("Face1"));
        assert_eq!(element_name("Body.Pad.Face3"), Some("Face3"));
    }

    #[test]
    fn element_name_of_container_paths() {
        assert_eq!(element_name(""), None);
        assert_eq!(element_name("Body."), None);
        assert_eq!(element_name("Body.Pad."), None);
    }

    #[test]
    fn strip_element_keeps_container_prefix() {
        assert_eq!(strip_element("Body.Pad.Face3"), "Body.Pad.");
        assert_eq!(strip_element("Face3"), "");
        assert_eq!(strip_element("Body."), "Body.");
        assert_eq!(strip_element(""), "");
    }

    #[test]
    fn descendant_matching_respects_boundaries() {
        assert!(is_descendant_path("Face1", ""));
        assert!(is_descendant_path("", ""));
        assert!(is_descendant_path("Pad.Face1", "Pad.Face1"));
        assert!(is_descendant_path("Pad.Face1", "Pad"));
        assert!(is_descendant_path("Pad.Face1", "Pad."));
        assert!(!is_descendant_path("Pad2.Face1", "Pad"));
        assert!(!is_descendant_path("Pad", "Pad.Face1"));
    }
}
