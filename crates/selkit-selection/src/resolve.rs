//! Reference resolution
//!
//! Maps a raw (document, object, sub-element) triple onto the document
//! model, producing the candidate record the container would store plus
//! the tri-state answer of whether an equivalent record is already
//! present.

use selkit_core::{strip_element, DocumentModel, ResolveError};

use crate::container::SelectionContainer;
use crate::record::{ElementName, SelectionRecord, SelectionRef};

/// Policy controlling how a raw sub-element path is normalized through
/// links and canonical naming before being compared or stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Exact raw path; no link following. The reference is rewritten
    /// relative to its top parent so a child of a link or array is not
    /// selected where the caller expects the top-level container.
    NoResolve,
    /// Resolve through links; prefer legacy indexed element names when
    /// comparing.
    #[default]
    OldStyleElement,
    /// Resolve through links; mapped names are canonical and must match
    /// exactly.
    NewStyleElement,
    /// Like `OldStyleElement`, and additionally permit type matching
    /// through one level of link indirection in type-filtered queries.
    FollowLink,
}

/// Whether an equivalent record is already in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The exact normalized reference is present.
    Present,
    /// Nothing equivalent is present.
    Absent,
    /// A record under an equivalent legacy/mapped element name is
    /// present (reported under `OldStyleElement` resolution only).
    EquivalentPresent,
}

/// A resolved candidate reference and its container presence.
#[derive(Debug, Clone)]
pub struct CheckedRef {
    /// The record an `add` would insert.
    pub record: SelectionRecord,
    /// Presence answer for idempotent-add detection.
    pub presence: Presence,
}

/// Resolve the document name, honoring the active-document wildcards.
pub(crate) fn resolve_document_name(
    model: &dyn DocumentModel,
    document: &str,
) -> Result<String, ResolveError> {
    if document.is_empty() || document == "*" {
        return model
            .active_document()
            .ok_or(ResolveError::NoActiveDocument);
    }
    if model.has_document(document) {
        Ok(document.to_string())
    } else {
        Err(ResolveError::DocumentNotFound {
            document: document.to_string(),
        })
    }
}

/// Resolve a raw reference into the record an add would store, and
/// answer whether it is already selected.
pub fn check_selection(
    model: &dyn DocumentModel,
    container: &SelectionContainer,
    document: &str,
    object: &str,
    sub_element: &str,
    mode: ResolveMode,
    suppress_top_parent: bool,
) -> Result<CheckedRef, ResolveError> {
    let document = resolve_document_name(model, document)?;

    if object.is_empty() || !model.object_exists(&document, object) {
        return Err(ResolveError::ObjectNotFound {
            document,
            object: object.to_string(),
        });
    }
    if model.is_pending_removal(&document, object) {
        return Err(ResolveError::ObjectPendingRemoval {
            document,
            object: object.to_string(),
        });
    }

    let (object, sub_element) = if mode == ResolveMode::NoResolve && !suppress_top_parent {
        model
            .top_parent(&document, object, sub_element)
            .unwrap_or_else(|| (object.to_string(), sub_element.to_string()))
    } else {
        (object.to_string(), sub_element.to_string())
    };

    let mut record = SelectionRecord::new(document.clone(), object.clone(), sub_element.clone());
    match model.resolve_element(&document, &object, &sub_element, mode == ResolveMode::NoResolve) {
        Some(resolved) => {
            record.type_name = resolved.type_name;
            record.resolved_object = Some(resolved.object);
            record.element = ElementName {
                new_style: resolved.new_name,
                old_style: resolved.old_name,
            };
        }
        None if mode == ResolveMode::NoResolve => {
            // Raw references may outlive the geometry they named; keep
            // what the object itself can still tell us.
            record.type_name = model.object_type(&document, &object).unwrap_or_default();
        }
        None => {
            return Err(ResolveError::SubObjectNotFound {
                document,
                object,
                sub_element,
            });
        }
    }

    let presence = presence_of(container, &record, mode);
    Ok(CheckedRef { record, presence })
}

fn presence_of(
    container: &SelectionContainer,
    record: &SelectionRecord,
    mode: ResolveMode,
) -> Presence {
    if container.contains(&record.reference()) {
        return Presence::Present;
    }
    // Legacy-name resolution also accepts a record stored under the
    // equivalent old/new-style spelling; canonical mapped names must
    // match exactly.
    if mode == ResolveMode::OldStyleElement && !record.element.is_empty() {
        let prefix = strip_element(&record.sub_element);
        for alias in [&record.element.old_style, &record.element.new_style] {
            if alias.is_empty() {
                continue;
            }
            let alt = format!("{}{}", prefix, alias);
            if alt != record.sub_element {
                let alt_ref =
                    SelectionRef::new(record.document.clone(), record.object.clone(), alt);
                if container.contains(&alt_ref) {
                    return Presence::EquivalentPresent;
                }
            }
        }
    }
    Presence::Absent
}
