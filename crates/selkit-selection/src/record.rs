//! Selection value types
//!
//! A [`SelectionRef`] names what was selected; a [`SelectionRecord`] is
//! the full per-item state the container stores for it.

use serde::{Deserialize, Serialize};
use std::fmt;

use selkit_core::PickPoint;

/// A (document, object, sub-element) reference.
///
/// The empty sub-element path means the whole object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRef {
    /// Owning document name.
    pub document: String,
    /// Top-level object name within the document.
    pub object: String,
    /// Sub-element path beneath the object; empty for the whole object.
    pub sub_element: String,
}

impl SelectionRef {
    /// Build a reference from its parts.
    pub fn new(
        document: impl Into<String>,
        object: impl Into<String>,
        sub_element: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
            sub_element: sub_element.into(),
        }
    }

    /// Whether this reference names the whole object.
    pub fn is_whole_object(&self) -> bool {
        self.sub_element.is_empty()
    }
}

// Fully-qualified form used across status text and logs.
impl fmt::Display for SelectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sub_element.is_empty() {
            write!(f, "{}#{}", self.document, self.object)
        } else {
            write!(f, "{}#{}.{}", self.document, self.object, self.sub_element)
        }
    }
}

/// Canonical element name pair produced by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementName {
    /// Canonical mapped name; empty when the reference has no element.
    pub new_style: String,
    /// Legacy indexed name; empty when the reference has no element.
    pub old_style: String,
}

impl ElementName {
    /// Whether neither naming is present (a whole-object reference).
    pub fn is_empty(&self) -> bool {
        self.new_style.is_empty() && self.old_style.is_empty()
    }
}

/// One selected item as stored in the container.
///
/// Multiple records coexist per object, one per distinct sub-element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    /// Owning document name.
    pub document: String,
    /// Top-level object name.
    pub object: String,
    /// Raw sub-element path; empty for the whole object.
    pub sub_element: String,
    /// Name of the resolved target object; carried as a key, never a
    /// pointer, and re-validated against the model at use sites.
    pub resolved_object: Option<String>,
    /// Canonical element names captured at insertion time.
    pub element: ElementName,
    /// Pick location; zero when not a geometric pick.
    pub pick: PickPoint,
    /// Cached dynamic type of the resolved object for type-filtered
    /// queries.
    pub type_name: String,
    /// True once the replay line for this record has been emitted.
    pub(crate) logged: bool,
}

impl SelectionRecord {
    /// Build a bare record for a reference, with no resolution data.
    pub fn new(
        document: impl Into<String>,
        object: impl Into<String>,
        sub_element: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
            sub_element: sub_element.into(),
            resolved_object: None,
            element: ElementName::default(),
            pick: PickPoint::zero(),
            type_name: String::new(),
            logged: false,
        }
    }

    /// The reference this record stands for.
    pub fn reference(&self) -> SelectionRef {
        SelectionRef::new(
            self.document.clone(),
            self.object.clone(),
            self.sub_element.clone(),
        )
    }

    /// Uniqueness key within a container.
    pub(crate) fn key(&self) -> (String, String, String) {
        (
            self.document.clone(),
            self.object.clone(),
            self.sub_element.clone(),
        )
    }

    /// Key under which the record is indexed for cascade purges.
    pub(crate) fn object_key(&self) -> (String, String) {
        let target = self
            .resolved_object
            .clone()
            .unwrap_or_else(|| self.object.clone());
        (self.document.clone(), target)
    }
}

/// Selection grouped per object, as returned by grouped queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionGroup {
    /// Owning document name.
    pub document: String,
    /// Object the group describes.
    pub object: String,
    /// Cached dynamic type of the object.
    pub type_name: String,
    /// Non-empty sub-element paths selected on the object, in selection
    /// order.
    pub sub_names: Vec<String>,
    /// Pick points parallel to `sub_names`.
    pub pick_points: Vec<PickPoint>,
}
