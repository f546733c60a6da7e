//! In-memory reference implementation of the document model contract.
//!
//! Backs the engine's test suites and gives embedders a minimal model to
//! start from: named documents holding named, typed objects that may
//! carry labels, a parent container, a link to another object, and a set
//! of named elements (faces, edges, ...) with old-style and mapped
//! new-style names.

use parking_lot::RwLock;
use std::collections::HashMap;

use super::{DocumentModel, ResolvedElement};

const MAX_LINK_DEPTH: usize = 64;

#[derive(Debug, Clone)]
struct ElementEntry {
    old: String,
    new: String,
}

#[derive(Debug, Clone, Default)]
struct ObjectEntry {
    type_name: String,
    label: Option<String>,
    parent: Option<String>,
    link: Option<String>,
    pending_removal: bool,
    elements: Vec<ElementEntry>,
}

#[derive(Debug, Clone, Default)]
struct DocumentEntry {
    objects: HashMap<String, ObjectEntry>,
}

impl DocumentEntry {
    /// Follow the link chain from `object` to its terminal target.
    fn follow_links(&self, object: &str) -> String {
        let mut cur = object.to_string();
        for _ in 0..MAX_LINK_DEPTH {
            match self.objects.get(&cur).and_then(|o| o.link.clone()) {
                Some(next) if self.objects.contains_key(&next) => cur = next,
                _ => break,
            }
        }
        cur
    }
}

#[derive(Debug, Default)]
struct ModelInner {
    documents: HashMap<String, DocumentEntry>,
    active: Option<String>,
}

/// In-memory document model.
///
/// Interior-mutable so tests and embedders can reshape the model while
/// the engine holds a shared handle to it.
#[derive(Debug, Default)]
pub struct MemoryModel {
    inner: RwLock<ModelInner>,
}

impl MemoryModel {
    /// Create an empty model with no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; the first added document becomes active.
    pub fn add_document(&self, name: &str) {
        let mut inner = self.inner.write();
        inner.documents.entry(name.to_string()).or_default();
        if inner.active.is_none() {
            inner.active = Some(name.to_string());
        }
    }

    /// Remove a document entirely.
    pub fn remove_document(&self, name: &str) {
        let mut inner = self.inner.write();
        inner.documents.remove(name);
        if inner.active.as_deref() == Some(name) {
            inner.active = None;
        }
    }

    /// Make the named document the active one.
    pub fn set_active_document(&self, name: &str) {
        let mut inner = self.inner.write();
        if inner.documents.contains_key(name) {
            inner.active = Some(name.to_string());
        }
    }

    /// Add an object with a dynamic type name, creating the document if
    /// needed.
    pub fn add_object(&self, document: &str, object: &str, type_name: &str) {
        let mut inner = self.inner.write();
        if inner.active.is_none() {
            inner.active = Some(document.to_string());
        }
        let doc = inner.documents.entry(document.to_string()).or_default();
        doc.objects.insert(
            object.to_string(),
            ObjectEntry {
                type_name: type_name.to_string(),
                ..ObjectEntry::default()
            },
        );
    }

    /// Remove an object.
    pub fn remove_object(&self, document: &str, object: &str) {
        let mut inner = self.inner.write();
        if let Some(doc) = inner.documents.get_mut(document) {
            doc.objects.remove(object);
        }
    }

    /// Flag an object as mid-deletion.
    pub fn mark_pending_removal(&self, document: &str, object: &str) {
        self.with_object(document, object, |o| o.pending_removal = true);
    }

    /// Set an object's user-visible label.
    pub fn set_label(&self, document: &str, object: &str, label: &str) {
        let label = label.to_string();
        self.with_object(document, object, move |o| o.label = Some(label));
    }

    /// Make `object` a child of `parent` within the same document.
    pub fn set_parent(&self, document: &str, object: &str, parent: &str) {
        let parent = parent.to_string();
        self.with_object(document, object, move |o| o.parent = Some(parent));
    }

    /// Make `object` a link pointing at `target` within the same document.
    pub fn set_link(&self, document: &str, object: &str, target: &str) {
        let target = target.to_string();
        self.with_object(document, object, move |o| o.link = Some(target));
    }

    /// Add an element with a derived mapped name (`";<old>"`).
    pub fn add_element(&self, document: &str, object: &str, old_name: &str) {
        let mapped = format!(";{}", old_name);
        self.add_element_mapped(document, object, old_name, &mapped);
    }

    /// Add an element with an explicit mapped new-style name.
    pub fn add_element_mapped(&self, document: &str, object: &str, old_name: &str, new_name: &str) {
        let entry = ElementEntry {
            old: old_name.to_string(),
            new: new_name.to_string(),
        };
        self.with_object(document, object, move |o| o.elements.push(entry));
    }

    fn with_object(&self, document: &str, object: &str, f: impl FnOnce(&mut ObjectEntry)) {
        let mut inner = self.inner.write();
        if let Some(obj) = inner
            .documents
            .get_mut(document)
            .and_then(|d| d.objects.get_mut(object))
        {
            f(obj);
        }
    }
}

impl DocumentModel for MemoryModel {
    fn active_document(&self) -> Option<String> {
        self.inner.read().active.clone()
    }

    fn has_document(&self, name: &str) -> bool {
        self.inner.read().documents.contains_key(name)
    }

    fn object_exists(&self, document: &str, object: &str) -> bool {
        self.inner
            .read()
            .documents
            .get(document)
            .is_some_and(|d| d.objects.contains_key(object))
    }

    fn is_pending_removal(&self, document: &str, object: &str) -> bool {
        self.inner
            .read()
            .documents
            .get(document)
            .and_then(|d| d.objects.get(object))
            .is_some_and(|o| o.pending_removal)
    }

    fn object_type(&self, document: &str, object: &str) -> Option<String> {
        self.inner
            .read()
            .documents
            .get(document)?
            .objects
            .get(object)
            .map(|o| o.type_name.clone())
    }

    fn object_label(&self, document: &str, object: &str) -> Option<String> {
        self.inner
            .read()
            .documents
            .get(document)?
            .objects
            .get(object)?
            .label
            .clone()
    }

    fn linked_object(&self, document: &str, object: &str, recurse: bool) -> Option<String> {
        let inner = self.inner.read();
        let doc = inner.documents.get(document)?;
        let first = doc.objects.get(object)?.link.clone()?;
        if recurse {
            Some(doc.follow_links(&first))
        } else {
            Some(first)
        }
    }

    fn resolve_element(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        allow_partial: bool,
    ) -> Option<ResolvedElement> {
        let inner = self.inner.read();
        let doc = inner.documents.get(document)?;
        if !doc.objects.contains_key(object) {
            return None;
        }

        let mut cur = object.to_string();
        let mut old_name = String::new();
        let mut new_name = String::new();

        let segments: Vec<&str> = sub_element.split('.').filter(|s| !s.is_empty()).collect();
        for (i, seg) in segments.iter().enumerate() {
            if doc.objects.contains_key(*seg) {
                cur = (*seg).to_string();
                continue;
            }
            // Not a sub-object; only the trailing segment may name an element.
            if i + 1 != segments.len() {
                return None;
            }
            let target = doc.follow_links(&cur);
            let entry = doc
                .objects
                .get(&target)?
                .elements
                .iter()
                .find(|e| e.old == *seg || e.new == *seg);
            match entry {
                Some(e) => {
                    old_name = e.old.clone();
                    new_name = e.new.clone();
                }
                None if allow_partial => {}
                None => return None,
            }
        }

        let target = doc.follow_links(&cur);
        let target_entry = doc.objects.get(&target)?;
        Some(ResolvedElement {
            object: target,
            type_name: target_entry.type_name.clone(),
            old_name,
            new_name,
        })
    }

    fn top_parent(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
    ) -> Option<(String, String)> {
        let inner = self.inner.read();
        let doc = inner.documents.get(document)?;
        if !doc.objects.contains_key(object) {
            return None;
        }

        let mut chain = Vec::new();
        let mut cur = object.to_string();
        for _ in 0..MAX_LINK_DEPTH {
            match doc.objects.get(&cur).and_then(|o| o.parent.clone()) {
                Some(parent) if doc.objects.contains_key(&parent) => {
                    chain.push(cur);
                    cur = parent;
                }
                _ => break,
            }
        }

        if chain.is_empty() {
            return Some((cur, sub_element.to_string()));
        }
        chain.reverse();
        let rewritten = format!("{}.{}", chain.join("."), sub_element);
        Some((cur, rewritten))
    }
}
