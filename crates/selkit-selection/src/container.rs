//! Ordered, multiply-indexed selection container
//!
//! One canonical insertion-ordered sequence of [`SelectionRecord`]s plus
//! two auxiliary hash indices kept in sync on every mutation: the
//! `(document, object, sub-element)` key for uniqueness checks, and the
//! `(document, resolved-object)` key for cascade purges when the model
//! deletes an object. Raw iterators are never handed across a call that
//! could mutate the container.

use std::collections::HashMap;

use crate::record::{SelectionRecord, SelectionRef};

type RecordKey = (String, String, String);
type ObjectKey = (String, String);

/// The selection set proper.
#[derive(Debug, Default)]
pub struct SelectionContainer {
    records: Vec<SelectionRecord>,
    by_key: HashMap<RecordKey, usize>,
    by_object: HashMap<ObjectKey, Vec<usize>>,
}

impl SelectionContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of selected records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[SelectionRecord] {
        &self.records
    }

    /// Whether the exact reference is present.
    pub fn contains(&self, reference: &SelectionRef) -> bool {
        self.by_key.contains_key(&(
            reference.document.clone(),
            reference.object.clone(),
            reference.sub_element.clone(),
        ))
    }

    /// Record stored for the exact reference.
    pub fn get(&self, reference: &SelectionRef) -> Option<&SelectionRecord> {
        let pos = self.by_key.get(&(
            reference.document.clone(),
            reference.object.clone(),
            reference.sub_element.clone(),
        ))?;
        self.records.get(*pos)
    }

    /// Insert a record, enforcing the uniqueness invariant.
    ///
    /// Returns false (leaving the existing record untouched) when the
    /// key is already present — callers may race within one synchronous
    /// call chain, so the container itself is the last line of defense
    /// against double insertion.
    pub fn insert(&mut self, record: SelectionRecord) -> bool {
        let key = record.key();
        if self.by_key.contains_key(&key) {
            return false;
        }
        let pos = self.records.len();
        self.by_key.insert(key, pos);
        self.by_object.entry(record.object_key()).or_default().push(pos);
        self.records.push(record);
        true
    }

    /// Remove the exact reference, returning its record.
    pub fn remove(&mut self, reference: &SelectionRef) -> Option<SelectionRecord> {
        let key = (
            reference.document.clone(),
            reference.object.clone(),
            reference.sub_element.clone(),
        );
        let pos = self.by_key.get(&key).copied()?;
        let record = self.records.remove(pos);
        self.rebuild_indices();
        Some(record)
    }

    /// Remove every record matching the predicate, returning them in
    /// insertion order.
    pub fn remove_matching(
        &mut self,
        mut predicate: impl FnMut(&SelectionRecord) -> bool,
    ) -> Vec<SelectionRecord> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.records.len());
        for record in self.records.drain(..) {
            if predicate(&record) {
                removed.push(record);
            } else {
                kept.push(record);
            }
        }
        self.records = kept;
        if !removed.is_empty() {
            self.rebuild_indices();
        }
        removed
    }

    /// Positions of the records indexed under the resolved object.
    pub fn records_for_object(&self, document: &str, object: &str) -> Vec<&SelectionRecord> {
        self.by_object
            .get(&(document.to_string(), object.to_string()))
            .map(|positions| positions.iter().map(|p| &self.records[*p]).collect())
            .unwrap_or_default()
    }

    /// Drop everything.
    pub fn clear(&mut self) -> Vec<SelectionRecord> {
        self.by_key.clear();
        self.by_object.clear();
        self.records.drain(..).collect()
    }

    fn rebuild_indices(&mut self) {
        self.by_key.clear();
        self.by_object.clear();
        for (pos, record) in self.records.iter().enumerate() {
            self.by_key.insert(record.key(), pos);
            self.by_object
                .entry(record.object_key())
                .or_default()
                .push(pos);
        }
    }

    /// Internal consistency check used by the property tests.
    #[cfg(test)]
    pub(crate) fn indices_consistent(&self) -> bool {
        if self.by_key.len() != self.records.len() {
            return false;
        }
        self.records.iter().enumerate().all(|(pos, record)| {
            self.by_key.get(&record.key()) == Some(&pos)
                && self
                    .by_object
                    .get(&record.object_key())
                    .is_some_and(|v| v.contains(&pos))
        })
    }
}
