//! Selection hub
//!
//! The process-wide orchestrator composing the container, preselection,
//! notification router, gate, history stacks, and context stack. All
//! mutation of selection state goes through this type; no other
//! component touches the underlying collections.
//!
//! Re-entrancy: observer callbacks invoked during a notification drain
//! may call back into any hub method. This is safe because every
//! container mutation completes (and its lock is released) before the
//! corresponding message is dispatched, queued messages are re-validated
//! against live state at drain time, and stack navigation holds a
//! dedicated lock so its restoration calls do not push new snapshots.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;

use selkit_core::{
    is_descendant_path, strip_element, DocumentModel, Error, HostSurface, MemoryModel, NullHost,
    NullReplayLog, NullViewBridge, PickPoint, ReplayLog, Result, SelectionConfig, ViewBridge,
};

use crate::container::SelectionContainer;
use crate::context::ContextStack;
use crate::events::{ChangeFilter, SelectionChange};
use crate::format::format_status;
use crate::gate::{InstalledGate, SelectionGate};
use crate::guards::{NotificationPauseGuard, ReplayLogPauseGuard, TopParentCheckGuard};
use crate::preselect::{PreselectResult, PreselectSource, PreselectionState};
use crate::record::{SelectionGroup, SelectionRecord, SelectionRef};
use crate::resolve::{check_selection, resolve_document_name, Presence, ResolveMode};
use crate::router::{NotificationRouter, SubscriptionId};
use crate::stack::{SelectionSnapshot, SelectionStack};

/// Visibility operation applied to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMode {
    /// Make the selected objects visible.
    Show,
    /// Hide the selected objects.
    Hide,
    /// Invert each selected object's visibility.
    Toggle,
}

#[derive(Debug)]
struct HubState {
    container: SelectionContainer,
    preselect: PreselectionState,
    picked: Vec<SelectionRecord>,
    picked_enabled: bool,
    stack: SelectionStack,
    context: ContextStack,
    gate: Option<InstalledGate>,
    replay_disabled: usize,
    top_parent_check_disabled: usize,
    stack_locked: bool,
}

impl HubState {
    fn new(config: &SelectionConfig) -> Self {
        Self {
            container: SelectionContainer::new(),
            preselect: PreselectionState::default(),
            picked: Vec::new(),
            picked_enabled: false,
            stack: SelectionStack::new(config.stack_capacity),
            context: ContextStack::default(),
            gate: None,
            replay_disabled: 0,
            top_parent_check_disabled: 0,
            stack_locked: false,
        }
    }
}

fn snapshot_of(container: &SelectionContainer) -> SelectionSnapshot {
    container.records().iter().map(|r| r.reference()).collect()
}

/// The process-wide selection orchestrator.
pub struct SelectionHub {
    model: Arc<dyn DocumentModel>,
    view: Arc<dyn ViewBridge>,
    host: Arc<dyn HostSurface>,
    replay: Arc<dyn ReplayLog>,
    config: SelectionConfig,
    state: Mutex<HubState>,
    router: NotificationRouter,
}

impl SelectionHub {
    /// Create a hub over the given document model with default
    /// configuration and no-op bridges.
    pub fn new(model: Arc<dyn DocumentModel>) -> Self {
        Self::with_config(model, SelectionConfig::default())
    }

    /// Create a hub with explicit configuration.
    pub fn with_config(model: Arc<dyn DocumentModel>, config: SelectionConfig) -> Self {
        let config = config.normalized();
        Self {
            model,
            view: Arc::new(NullViewBridge),
            host: Arc::new(NullHost),
            replay: Arc::new(NullReplayLog),
            state: Mutex::new(HubState::new(&config)),
            router: NotificationRouter::new(
                config.collapse_threshold,
                config.recursion_ceiling,
                config.channel_capacity,
            ),
            config,
        }
    }

    /// Attach the view-provider bridge.
    pub fn with_view_bridge(mut self, view: Arc<dyn ViewBridge>) -> Self {
        self.view = view;
        self
    }

    /// Attach the host status/tooltip surface.
    pub fn with_host(mut self, host: Arc<dyn HostSurface>) -> Self {
        self.host = host;
        self
    }

    /// Attach the replay-line sink.
    pub fn with_replay_log(mut self, replay: Arc<dyn ReplayLog>) -> Self {
        self.replay = replay;
        self
    }

    /// Get the active configuration.
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Subscribe a synchronous observer.
    ///
    /// The handler runs during notification drain on the mutating call
    /// stack and may call back into the hub. Errors it returns are
    /// logged and do not abort the drain. Observers must unsubscribe
    /// before their captured state is torn down.
    pub fn subscribe<F>(&self, filter: ChangeFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&SelectionChange) -> std::result::Result<(), Error> + Send + Sync + 'static,
    {
        self.router.subscribe(filter, handler)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.router.unsubscribe(id)
    }

    /// Number of synchronous observers.
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }

    /// Get a broadcast receiver for async change consumption.
    pub fn receiver(&self) -> broadcast::Receiver<SelectionChange> {
        self.router.receiver()
    }

    // ------------------------------------------------------------------
    // Add / remove / clear
    // ------------------------------------------------------------------

    /// Add a reference to the selection.
    ///
    /// Returns whether the reference is present in the container when
    /// the call returns; an observer invoked during the notification
    /// drain may have removed it again. A reference that does not
    /// resolve is not an error, just nothing to add.
    pub fn add_selection(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        pick: PickPoint,
        picked_list: Option<Vec<SelectionRecord>>,
        clear_preselect: bool,
    ) -> bool {
        if let Some(picked) = picked_list {
            self.replace_picked_list(picked);
        }

        let checked = {
            let state = self.state.lock();
            check_selection(
                self.model.as_ref(),
                &state.container,
                document,
                object,
                sub_element,
                ResolveMode::NoResolve,
                state.top_parent_check_disabled > 0,
            )
        };
        let mut record = match checked {
            Ok(checked) => {
                if checked.presence == Presence::Present {
                    return true;
                }
                checked.record
            }
            Err(err) => {
                tracing::debug!("add_selection skipped: {}", err);
                return false;
            }
        };
        record.pick = pick;
        let reference = record.reference();

        if !self.consult_gate(&record, true) {
            return false;
        }

        let replay_line = {
            let mut state = self.state.lock();
            let mut line = None;
            if state.replay_disabled == 0 && !record.logged {
                line = Some(format!(
                    "add_selection(\"{}\", \"{}\", \"{}\")",
                    reference.document, reference.object, reference.sub_element
                ));
                record.logged = true;
            }
            // The container defends against double insertion: another
            // caller may have raced us within this synchronous chain.
            state.container.insert(record);
            line
        };
        if let Some(line) = replay_line {
            self.replay.append_line(&line);
        }

        self.push_history_snapshot(true);

        if clear_preselect {
            self.remove_preselect(true);
        }

        self.view.warm_bounding_box(
            &reference.document,
            &reference.object,
            strip_element(&reference.sub_element),
        );

        self.notify(SelectionChange::Added {
            item: reference.clone(),
            pick,
        });

        self.state.lock().container.contains(&reference)
    }

    /// Add a batch of references, without clearing first.
    ///
    /// Returns true when at least one reference ended up selected.
    pub fn add_selections(&self, references: &[SelectionRef]) -> bool {
        let mut any = false;
        for reference in references {
            any |= self.add_selection(
                &reference.document,
                &reference.object,
                &reference.sub_element,
                PickPoint::zero(),
                None,
                false,
            );
        }
        any
    }

    /// Remove a reference and all of its selected descendants.
    ///
    /// Removing a parent path removes every record beneath it; removing
    /// a specific sub-element leaves a separately selected whole-object
    /// record in place. Returns whether anything was removed.
    pub fn remove_selection(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        picked_list: Option<Vec<SelectionRecord>>,
    ) -> bool {
        if let Some(picked) = picked_list {
            self.replace_picked_list(picked);
        }

        let document = match resolve_document_name(self.model.as_ref(), document) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::debug!("remove_selection skipped: {}", err);
                return false;
            }
        };

        // Collect and mutate first; messages go out only after the
        // container is consistent again.
        let removed = {
            let mut state = self.state.lock();
            state.container.remove_matching(|rec| {
                rec.document == document
                    && rec.object == object
                    && is_descendant_path(&rec.sub_element, sub_element)
            })
        };
        if removed.is_empty() {
            return false;
        }

        let replay_enabled = self.state.lock().replay_disabled == 0;
        if replay_enabled {
            self.replay.append_line(&format!(
                "remove_selection(\"{}\", \"{}\", \"{}\")",
                document, object, sub_element
            ));
        }

        self.push_history_snapshot(true);

        for record in &removed {
            self.notify(SelectionChange::Removed {
                item: record.reference(),
            });
        }
        true
    }

    /// Clear the selection of one document, or everything for an empty
    /// or `"*"` name.
    pub fn clear_selection(&self, document: Option<&str>, clear_preselect: bool) {
        let Some(document) = document.filter(|d| !d.is_empty() && *d != "*") else {
            self.clear_complete_selection(clear_preselect);
            return;
        };

        if clear_preselect {
            let preselect_here = {
                let state = self.state.lock();
                state
                    .preselect
                    .current()
                    .is_some_and(|rec| rec.document == document)
            };
            if preselect_here {
                self.remove_preselect(true);
            }
        }

        let removed_any = {
            let mut state = self.state.lock();
            !state
                .container
                .remove_matching(|rec| rec.document == document)
                .is_empty()
        };
        if !removed_any {
            return;
        }

        let replay_enabled = self.state.lock().replay_disabled == 0;
        if replay_enabled {
            self.replay
                .append_line(&format!("clear_selection(\"{}\")", document));
        }

        self.push_history_snapshot(true);

        // One message scoped to the document, not one per record.
        self.notify(SelectionChange::Cleared {
            document: Some(document.to_string()),
        });
    }

    /// Drop the selection across all documents.
    ///
    /// The picked list and (optionally) the preselection are cleared
    /// even when the container is already empty; the `Cleared` message
    /// is only emitted when membership actually changed.
    pub fn clear_complete_selection(&self, clear_preselect: bool) {
        self.state.lock().picked.clear();

        if clear_preselect {
            self.remove_preselect(true);
        }

        let was_empty = {
            let mut state = self.state.lock();
            if state.container.is_empty() {
                true
            } else {
                state.container.clear();
                false
            }
        };
        if was_empty {
            return;
        }

        let replay_enabled = self.state.lock().replay_disabled == 0;
        if replay_enabled {
            self.replay.append_line("clear_selection()");
        }

        self.notify(SelectionChange::Cleared { document: None });
    }

    /// Re-notify a visibility-only change without altering membership.
    pub fn update_selection(&self, show: bool, document: &str, object: &str, sub_element: &str) {
        let reference = SelectionRef::new(document, object, sub_element);
        if self.state.lock().container.contains(&reference) {
            self.notify(SelectionChange::VisibilityTouched {
                item: reference,
                visible: show,
            });
        }
    }

    /// Apply a visibility operation to every object in the current
    /// selection, through the view bridge.
    pub fn set_visible(&self, mode: VisibilityMode) {
        let targets: Vec<(String, String, SelectionRef)> = {
            let state = self.state.lock();
            let mut seen = HashSet::new();
            let mut targets = Vec::new();
            for record in state.container.records() {
                let object = record
                    .resolved_object
                    .clone()
                    .unwrap_or_else(|| record.object.clone());
                if seen.insert((record.document.clone(), object.clone())) {
                    targets.push((record.document.clone(), object, record.reference()));
                }
            }
            targets
        };

        let replay_enabled = self.state.lock().replay_disabled == 0;
        for (document, object, reference) in targets {
            let current = self.view.is_visible(&document, &object).unwrap_or(false);
            let visible = match mode {
                VisibilityMode::Show => true,
                VisibilityMode::Hide => false,
                VisibilityMode::Toggle => !current,
            };
            self.view.set_visible(&document, &object, visible);
            if replay_enabled {
                self.replay.append_line(&format!(
                    "set_visible(\"{}\", \"{}\", {})",
                    document, object, visible
                ));
            }
            self.notify(SelectionChange::VisibilityTouched {
                item: reference,
                visible,
            });
        }
    }

    // ------------------------------------------------------------------
    // Picked list
    // ------------------------------------------------------------------

    /// Enable or disable picked-list tracking. Disabling drops the
    /// current list.
    pub fn enable_picked_list(&self, enabled: bool) {
        let notify = {
            let mut state = self.state.lock();
            state.picked_enabled = enabled;
            if !enabled && !state.picked.is_empty() {
                state.picked.clear();
                true
            } else {
                false
            }
        };
        if notify {
            self.notify(SelectionChange::PickedListChanged);
        }
    }

    /// Whether picked-list tracking is enabled.
    pub fn picked_list_enabled(&self) -> bool {
        self.state.lock().picked_enabled
    }

    /// The candidates under the cursor for the most recent pick event.
    pub fn picked_list(&self) -> Vec<SelectionRecord> {
        self.state.lock().picked.clone()
    }

    fn replace_picked_list(&self, picked: Vec<SelectionRecord>) {
        let changed = {
            let mut state = self.state.lock();
            if state.picked_enabled {
                state.picked = picked;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify(SelectionChange::PickedListChanged);
        }
    }

    // ------------------------------------------------------------------
    // Preselection
    // ------------------------------------------------------------------

    /// Make a reference the hovered preselection.
    pub fn set_preselect(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        pick: PickPoint,
        source: PreselectSource,
        show_status: bool,
    ) -> PreselectResult {
        let checked = {
            let state = self.state.lock();
            check_selection(
                self.model.as_ref(),
                &state.container,
                document,
                object,
                sub_element,
                ResolveMode::NoResolve,
                state.top_parent_check_disabled > 0,
            )
        };
        let mut record = match checked {
            Ok(checked) => checked.record,
            Err(err) => {
                tracing::debug!("set_preselect skipped: {}", err);
                return PreselectResult::Ignored;
            }
        };
        record.pick = pick;
        let reference = record.reference();

        // Hovering the same reference only moves the coordinates; that
        // is too frequent to notify observers about.
        {
            let mut state = self.state.lock();
            if state.preselect.is_current(&reference) {
                if state.preselect.current().map(|rec| rec.pick) == Some(pick) {
                    return PreselectResult::Ignored;
                }
                state.preselect.set_coords(pick);
                let text = format_status(self.model.as_ref(), &self.config, &record, false);
                state.preselect.set_status_text(text);
                return PreselectResult::Unchanged;
            }
        }

        // The prior hover goes away without restoring a rejection
        // cursor, to avoid visible flicker while sweeping the pointer.
        self.remove_preselect(false);

        if source == PreselectSource::External && !self.consult_gate(&record, false) {
            return PreselectResult::Rejected;
        }

        let status = format_status(self.model.as_ref(), &self.config, &record, false);
        {
            let mut state = self.state.lock();
            state.preselect.set(record);
            state.preselect.set_status_text(status.clone());
        }

        self.view.warm_bounding_box(
            &reference.document,
            &reference.object,
            strip_element(&reference.sub_element),
        );

        if show_status {
            self.host.show_status(&status);
            self.show_or_hide_tooltip(pick);
        }

        self.notify(SelectionChange::PreselectSet {
            item: reference,
            pick,
        });
        PreselectResult::Accepted
    }

    /// Clear the hovered preselection.
    ///
    /// With `restore_cursor`, an outstanding gate-rejection cursor
    /// override is restored. No-op when nothing is hovered.
    pub fn remove_preselect(&self, restore_cursor: bool) {
        let (had_hover, had_rejection) = {
            let mut state = self.state.lock();
            if state.preselect.is_empty() {
                return;
            }
            let had_rejection = state.preselect.has_rejection();
            let had_hover = state.preselect.clear().is_some();
            (had_hover, had_rejection)
        };
        if restore_cursor && had_rejection {
            self.host.restore_cursor();
        }
        self.host.hide_tooltip();
        if had_hover {
            self.notify(SelectionChange::PreselectCleared);
        }
    }

    /// Clear the hovered preselection, restoring the cursor.
    pub fn clear_preselection(&self) {
        self.remove_preselect(true);
    }

    /// The hovered record, if any.
    pub fn preselection(&self) -> Option<SelectionRecord> {
        self.state.lock().preselect.current().cloned()
    }

    /// Whether anything is hovered.
    pub fn has_preselection(&self) -> bool {
        self.state.lock().preselect.current().is_some()
    }

    /// Update only the hover coordinates and refresh the status text.
    ///
    /// Deliberately emits no notification: coordinate-only hover
    /// movement is too frequent for observers.
    pub fn set_preselect_coord(&self, pick: PickPoint) {
        let status = {
            let mut state = self.state.lock();
            state.preselect.set_coords(pick);
            let Some(record) = state.preselect.current().cloned() else {
                return;
            };
            let text = format_status(self.model.as_ref(), &self.config, &record, false);
            state.preselect.set_status_text(text.clone());
            text
        };
        self.host.show_status(&status);
    }

    /// Install the free-text preselection message shown as the hover
    /// tooltip, refreshing the tooltip when a hover is active.
    pub fn set_preselection_text(&self, text: &str) {
        let pick = {
            let mut state = self.state.lock();
            state.preselect.set_message(text.to_string());
            state.preselect.current().map(|rec| rec.pick)
        };
        if let Some(pick) = pick {
            self.show_or_hide_tooltip(pick);
        }
    }

    /// The free-text preselection message.
    pub fn preselection_text(&self) -> String {
        self.state.lock().preselect.message().to_string()
    }

    /// The formatted status text of the current hover.
    pub fn preselection_status_text(&self) -> String {
        self.state.lock().preselect.status_text().to_string()
    }

    fn show_or_hide_tooltip(&self, pick: PickPoint) {
        let message = self.state.lock().preselect.message().to_string();
        if message.is_empty() {
            self.host.hide_tooltip();
        } else {
            self.host.show_tooltip(&message, Some(pick));
        }
    }

    // ------------------------------------------------------------------
    // Gate
    // ------------------------------------------------------------------

    /// Install a gate, replacing (and dropping) any previous one. The
    /// gate is consulted with references resolved under `mode`.
    pub fn add_selection_gate(&self, gate: impl SelectionGate + 'static, mode: ResolveMode) {
        self.state.lock().gate = Some(InstalledGate {
            gate: Arc::new(gate),
            mode,
        });
    }

    /// Remove the active gate, restoring the cursor.
    pub fn remove_selection_gate(&self) {
        let removed = self.state.lock().gate.take();
        if removed.is_some() {
            self.host.restore_cursor();
        }
    }

    /// Whether a gate is installed.
    pub fn has_selection_gate(&self) -> bool {
        self.state.lock().gate.is_some()
    }

    /// Consult the active gate for a resolved candidate record.
    ///
    /// On refusal shows the gate's reason in the host status area,
    /// applies the forbidden cursor (recording the reference so the
    /// next un-preselect restores it), and optionally beeps.
    fn consult_gate(&self, record: &SelectionRecord, beep: bool) -> bool {
        let Some(installed) = self.state.lock().gate.clone() else {
            return true;
        };

        // Resolve again under the gate's configured mode; fall back to
        // the raw reference when that resolution fails.
        let gate_view = {
            let state = self.state.lock();
            check_selection(
                self.model.as_ref(),
                &state.container,
                &record.document,
                &record.object,
                &record.sub_element,
                installed.mode,
                state.top_parent_check_disabled > 0,
            )
            .map(|checked| checked.record)
            .unwrap_or_else(|_| record.clone())
        };
        let (object, sub_element) = match installed.mode {
            ResolveMode::NoResolve => (gate_view.object.clone(), gate_view.sub_element.clone()),
            ResolveMode::NewStyleElement => (
                gate_view
                    .resolved_object
                    .clone()
                    .unwrap_or_else(|| gate_view.object.clone()),
                gate_view.element.new_style.clone(),
            ),
            ResolveMode::OldStyleElement | ResolveMode::FollowLink => (
                gate_view
                    .resolved_object
                    .clone()
                    .unwrap_or_else(|| gate_view.object.clone()),
                gate_view.element.old_style.clone(),
            ),
        };

        if installed
            .gate
            .allow(&gate_view.document, &object, &sub_element)
        {
            return true;
        }

        let reason = installed
            .gate
            .rejection_reason()
            .unwrap_or_else(|| "Selection not allowed by filter".to_string());
        tracing::debug!("gate rejected {}: {}", record.reference(), reason);

        self.state.lock().preselect.set_rejected(record.reference());
        self.host.show_status(&reason);
        self.host.set_forbidden_cursor();
        if beep {
            self.host.beep();
        }
        false
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether anything is selected, optionally scoped to a document.
    pub fn has_selection(&self, document: Option<&str>) -> bool {
        let state = self.state.lock();
        match document {
            None => !state.container.is_empty(),
            Some(doc) => state
                .container
                .records()
                .iter()
                .any(|rec| rec.document == doc),
        }
    }

    /// Whether the reference is selected, under the given resolution.
    pub fn is_selected(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        mode: ResolveMode,
    ) -> bool {
        let state = self.state.lock();
        check_selection(
            self.model.as_ref(),
            &state.container,
            document,
            object,
            sub_element,
            mode,
            state.top_parent_check_disabled > 0,
        )
        .map(|checked| checked.presence != Presence::Absent)
        .unwrap_or(false)
    }

    /// The selected records. An empty or absent document name scopes to
    /// the active document, `"*"` to all documents.
    pub fn selection(&self, document: Option<&str>, mode: ResolveMode) -> Vec<SelectionRecord> {
        let Some(doc_filter) = self.document_filter(document) else {
            return Vec::new();
        };

        let state = self.state.lock();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in state.container.records() {
            if let Some(doc) = doc_filter.as_deref() {
                if record.document != doc {
                    continue;
                }
            }
            let mapped = Self::resolved_view(record, mode);
            if seen.insert(mapped.key()) {
                out.push(mapped);
            }
        }
        out
    }

    /// The selection grouped per object, with sub-element and pick
    /// lists in selection order.
    pub fn selection_grouped(
        &self,
        document: Option<&str>,
        mode: ResolveMode,
    ) -> Vec<SelectionGroup> {
        let mut groups: Vec<SelectionGroup> = Vec::new();
        for record in self.selection(document, mode) {
            let pos = groups
                .iter()
                .position(|g| g.document == record.document && g.object == record.object)
                .unwrap_or_else(|| {
                    groups.push(SelectionGroup {
                        document: record.document.clone(),
                        object: record.object.clone(),
                        type_name: record.type_name.clone(),
                        sub_names: Vec::new(),
                        pick_points: Vec::new(),
                    });
                    groups.len() - 1
                });
            if !record.sub_element.is_empty() {
                groups[pos].sub_names.push(record.sub_element.clone());
                groups[pos].pick_points.push(record.pick);
            }
        }
        groups
    }

    /// Count the distinct selected objects of a type; an empty type
    /// name counts every selected object. Under `FollowLink`, an
    /// object's link target may satisfy the type instead.
    pub fn count_objects_of_type(
        &self,
        type_name: &str,
        document: Option<&str>,
        mode: ResolveMode,
    ) -> usize {
        let mut seen = HashSet::new();
        let mut count = 0;
        for record in self.selection(document, mode) {
            if !seen.insert((record.document.clone(), record.object.clone())) {
                continue;
            }
            let matches = type_name.is_empty()
                || record.type_name == type_name
                || (mode == ResolveMode::FollowLink
                    && self
                        .model
                        .linked_object(&record.document, &record.object, true)
                        .and_then(|target| self.model.object_type(&record.document, &target))
                        .is_some_and(|t| t == type_name));
            if matches {
                count += 1;
            }
        }
        count
    }

    /// Resolve a reference, surfacing resolution failures.
    ///
    /// Query entry point for binding layers, which expect failure
    /// signaling where the hot paths stay silent.
    pub fn resolve_reference(
        &self,
        document: &str,
        object: &str,
        sub_element: &str,
        mode: ResolveMode,
    ) -> Result<SelectionRecord> {
        let state = self.state.lock();
        let checked = check_selection(
            self.model.as_ref(),
            &state.container,
            document,
            object,
            sub_element,
            mode,
            state.top_parent_check_disabled > 0,
        )?;
        Ok(checked.record)
    }

    fn document_filter(&self, document: Option<&str>) -> Option<Option<String>> {
        match document {
            Some("*") => Some(None),
            None | Some("") => self.model.active_document().map(Some),
            Some(doc) => Some(Some(doc.to_string())),
        }
    }

    fn resolved_view(record: &SelectionRecord, mode: ResolveMode) -> SelectionRecord {
        match mode {
            ResolveMode::NoResolve => record.clone(),
            ResolveMode::NewStyleElement => {
                let mut mapped = record.clone();
                if let Some(object) = &record.resolved_object {
                    mapped.object = object.clone();
                }
                mapped.sub_element = record.element.new_style.clone();
                mapped
            }
            ResolveMode::OldStyleElement | ResolveMode::FollowLink => {
                let mut mapped = record.clone();
                if let Some(object) = &record.resolved_object {
                    mapped.object = object.clone();
                }
                mapped.sub_element = record.element.old_style.clone();
                mapped
            }
        }
    }

    // ------------------------------------------------------------------
    // History stack
    // ------------------------------------------------------------------

    /// Snapshot the current selection onto the back stack.
    pub fn push_sel_stack(&self, clear_forward: bool, overwrite: bool) {
        let mut state = self.state.lock();
        if state.stack_locked {
            return;
        }
        if clear_forward {
            state.stack.clear_forward();
        }
        let snapshot = snapshot_of(&state.container);
        state.stack.push(snapshot, overwrite);
    }

    /// Depth of the back stack.
    pub fn sel_stack_back_len(&self) -> usize {
        self.state.lock().stack.back_len()
    }

    /// Depth of the forward stack.
    pub fn sel_stack_forward_len(&self) -> usize {
        self.state.lock().stack.forward_len()
    }

    /// Navigate back through selection history.
    ///
    /// Moves up to `count` snapshots onto the forward stack and
    /// restores the selection from the snapshot then on top. A
    /// non-empty `indices` restricts restoration to those positions in
    /// the snapshot; `skip_empty` steps silently over snapshots whose
    /// referents were all deleted. Returns whether anything was
    /// restored.
    pub fn sel_stack_back(&self, count: usize, indices: &[usize], skip_empty: bool) -> bool {
        if !self.enter_stack_navigation() {
            return false;
        }
        let restored = self.sel_stack_back_inner(count, indices, skip_empty);
        self.leave_stack_navigation();
        restored
    }

    /// Navigate forward through selection history.
    pub fn sel_stack_forward(&self, count: usize, indices: &[usize], skip_empty: bool) -> bool {
        if !self.enter_stack_navigation() {
            return false;
        }
        let restored = self.sel_stack_forward_inner(count, indices, skip_empty);
        self.leave_stack_navigation();
        restored
    }

    /// References stored in a stack snapshot: non-negative indices
    /// address the back stack (0 = most recent), negative indices the
    /// forward stack (-1 = nearest), optionally scoped to a document.
    pub fn selection_from_stack(&self, document: Option<&str>, index: isize) -> Vec<SelectionRef> {
        let state = self.state.lock();
        let Some(snapshot) = state.stack.get(index) else {
            return Vec::new();
        };
        snapshot
            .iter()
            .filter(|r| document.is_none_or(|doc| r.document == doc))
            .cloned()
            .collect()
    }

    fn enter_stack_navigation(&self) -> bool {
        let mut state = self.state.lock();
        if state.stack_locked {
            return false;
        }
        state.stack_locked = true;
        true
    }

    fn leave_stack_navigation(&self) {
        self.state.lock().stack_locked = false;
    }

    fn sel_stack_back_inner(&self, count: usize, indices: &[usize], skip_empty: bool) -> bool {
        let mut count = {
            let state = self.state.lock();
            count.min(state.stack.back_len())
        };
        if count == 0 {
            return false;
        }

        let has_selection = !self.state.lock().container.is_empty();
        if has_selection {
            {
                let mut state = self.state.lock();
                let snapshot = snapshot_of(&state.container);
                state.stack.push(snapshot, true);
            }
            self.clear_complete_selection(false);
        } else {
            count -= 1;
        }

        {
            let mut state = self.state.lock();
            for _ in 0..count {
                state.stack.shift_back_to_forward();
            }
        }

        loop {
            let snapshot = { self.state.lock().stack.back_top().cloned() };
            let Some(snapshot) = snapshot else {
                return false;
            };
            if self.restore_snapshot(&snapshot, indices) {
                return true;
            }
            if !skip_empty {
                return false;
            }
            // Every referent is gone; step over the dead snapshot.
            if !self.state.lock().stack.shift_back_to_forward() {
                return false;
            }
        }
    }

    fn sel_stack_forward_inner(&self, count: usize, indices: &[usize], skip_empty: bool) -> bool {
        let count = {
            let state = self.state.lock();
            count.min(state.stack.forward_len())
        };
        if count == 0 {
            return false;
        }

        if !self.state.lock().container.is_empty() {
            {
                let mut state = self.state.lock();
                let snapshot = snapshot_of(&state.container);
                state.stack.push(snapshot, true);
            }
            self.clear_complete_selection(false);
        }

        {
            let mut state = self.state.lock();
            for _ in 0..count {
                state.stack.shift_forward_to_back();
            }
        }

        loop {
            let snapshot = { self.state.lock().stack.back_top().cloned() };
            let Some(snapshot) = snapshot else {
                return false;
            };
            if self.restore_snapshot(&snapshot, indices) {
                return true;
            }
            if !skip_empty {
                return false;
            }
            if !self.state.lock().stack.shift_forward_to_back() {
                return false;
            }
        }
    }

    fn restore_snapshot(&self, snapshot: &SelectionSnapshot, indices: &[usize]) -> bool {
        let mut restored = false;
        for (pos, reference) in snapshot.iter().enumerate() {
            if !indices.is_empty() && !indices.contains(&pos) {
                continue;
            }
            restored |= self.add_selection(
                &reference.document,
                &reference.object,
                &reference.sub_element,
                PickPoint::zero(),
                None,
                false,
            );
        }
        restored
    }

    fn push_history_snapshot(&self, clear_forward: bool) {
        if !self.config.record_history {
            return;
        }
        let mut state = self.state.lock();
        if state.stack_locked {
            return;
        }
        if clear_forward {
            state.stack.clear_forward();
        }
        let snapshot = snapshot_of(&state.container);
        state.stack.push(snapshot, false);
    }

    // ------------------------------------------------------------------
    // Context stack
    // ------------------------------------------------------------------

    /// Push an implicit operation context.
    pub fn push_context(&self, reference: SelectionRef) {
        self.state.lock().context.push(reference);
    }

    /// Pop the current operation context.
    pub fn pop_context(&self) -> Option<SelectionRef> {
        self.state.lock().context.pop()
    }

    /// Replace the current operation context.
    pub fn set_context(&self, reference: SelectionRef) {
        self.state.lock().context.set(reference);
    }

    /// The current operation context. With `extended`, falls back to
    /// the preselection and then the most recent selection.
    pub fn context(&self, extended: bool) -> Option<SelectionRef> {
        let state = self.state.lock();
        if let Some(reference) = state.context.peek() {
            return Some(reference.clone());
        }
        if !extended {
            return None;
        }
        if let Some(record) = state.preselect.current() {
            return Some(record.reference());
        }
        state.container.records().last().map(|rec| rec.reference())
    }

    // ------------------------------------------------------------------
    // Model bookkeeping
    // ------------------------------------------------------------------

    /// Purge every reference to a deleted object from the selection,
    /// preselection, and picked list.
    ///
    /// Routine bookkeeping driven by the document model, not an error
    /// path; emits the corresponding removal notifications.
    pub fn purge_object(&self, document: &str, object: &str) {
        let removed = {
            let mut state = self.state.lock();
            let mut keys: HashSet<SelectionRef> = state
                .container
                .records_for_object(document, object)
                .iter()
                .map(|rec| rec.reference())
                .collect();
            for record in state.container.records() {
                if record.document == document && record.object == object {
                    keys.insert(record.reference());
                }
            }
            state
                .picked
                .retain(|rec| !keys.contains(&rec.reference()));
            state.container.remove_matching(|rec| keys.contains(&rec.reference()))
        };

        let preselect_hit = {
            let state = self.state.lock();
            state.preselect.current().is_some_and(|rec| {
                rec.document == document
                    && (rec.object == object || rec.resolved_object.as_deref() == Some(object))
            })
        };
        if preselect_hit {
            self.remove_preselect(true);
        }

        for record in &removed {
            self.notify(SelectionChange::Removed {
                item: record.reference(),
            });
        }
    }

    /// Purge every reference to a closed document.
    pub fn purge_document(&self, document: &str) {
        let removed_any = {
            let mut state = self.state.lock();
            state.picked.retain(|rec| rec.document != document);
            !state
                .container
                .remove_matching(|rec| rec.document == document)
                .is_empty()
        };

        let preselect_hit = {
            let state = self.state.lock();
            state
                .preselect
                .current()
                .is_some_and(|rec| rec.document == document)
        };
        if preselect_hit {
            self.remove_preselect(true);
        }

        if removed_any {
            self.notify(SelectionChange::Cleared {
                document: Some(document.to_string()),
            });
        }
    }

    // ------------------------------------------------------------------
    // Scoped suppression
    // ------------------------------------------------------------------

    /// Defer notification draining until the guard drops.
    pub fn pause_notifications(&self) -> NotificationPauseGuard<'_> {
        self.router.pause();
        NotificationPauseGuard { hub: self }
    }

    pub(crate) fn resume_notifications(&self) {
        if self.router.resume() {
            self.flush_notifications();
        }
    }

    /// Drain messages queued while notifications were paused, then
    /// push a history snapshot.
    pub fn flush_notifications(&self) {
        if self.router.flush(&|change| self.change_is_live(change)) {
            self.push_history_snapshot(false);
        }
    }

    /// Suppress replay-line emission until the guard drops.
    pub fn suppress_replay_log(&self) -> ReplayLogPauseGuard<'_> {
        self.state.lock().replay_disabled += 1;
        ReplayLogPauseGuard { hub: self }
    }

    pub(crate) fn resume_replay_log(&self) {
        let mut state = self.state.lock();
        state.replay_disabled = state.replay_disabled.saturating_sub(1);
    }

    /// Suppress the top-parent rewrite of raw references until the
    /// guard drops.
    pub fn suppress_top_parent_check(&self) -> TopParentCheckGuard<'_> {
        self.state.lock().top_parent_check_disabled += 1;
        TopParentCheckGuard { hub: self }
    }

    pub(crate) fn resume_top_parent_check(&self) {
        let mut state = self.state.lock();
        state.top_parent_check_disabled = state.top_parent_check_disabled.saturating_sub(1);
    }

    // ------------------------------------------------------------------
    // Notification plumbing
    // ------------------------------------------------------------------

    fn notify(&self, change: SelectionChange) {
        self.router
            .notify(change, &|queued| self.change_is_live(queued));
    }

    /// Re-validate a queued message against current state at drain
    /// time; an observer earlier in the cycle may have made it moot.
    fn change_is_live(&self, change: &SelectionChange) -> bool {
        let state = self.state.lock();
        match change {
            SelectionChange::Added { item, .. } => state.container.contains(item),
            SelectionChange::Removed { item } => !state.container.contains(item),
            SelectionChange::PreselectSet { item, .. } => state.preselect.is_current(item),
            _ => true,
        }
    }
}

impl std::fmt::Debug for SelectionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SelectionHub")
            .field("selected", &state.container.len())
            .field("preselected", &state.preselect.current().is_some())
            .field("gated", &state.gate.is_some())
            .finish()
    }
}

/// Global hub instance
static SELECTION_HUB: OnceLock<SelectionHub> = OnceLock::new();

/// Get or initialize the global selection hub.
///
/// Falls back to a hub over an empty in-memory model when
/// [`init_selection_hub`] was not called first.
pub fn selection_hub() -> &'static SelectionHub {
    SELECTION_HUB.get_or_init(|| SelectionHub::new(Arc::new(MemoryModel::new())))
}

/// Install the application's hub as the global instance.
///
/// Must be called before any call to [`selection_hub`]; returns the
/// hub back when the global was already initialized.
pub fn init_selection_hub(hub: SelectionHub) -> std::result::Result<(), SelectionHub> {
    SELECTION_HUB.set(hub)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hub() -> SelectionHub {
        let model = Arc::new(MemoryModel::new());
        model.add_document("Doc1");
        model.add_object("Doc1", "Box", "Part::Box");
        model.add_element("Doc1", "Box", "Face1");
        model.add_element("Doc1", "Box", "Edge3");
        SelectionHub::new(model)
    }

    #[test]
    fn add_and_query() {
        let hub = test_hub();
        assert!(hub.add_selection("Doc1", "Box", "Face1", PickPoint::zero(), None, false));
        assert!(hub.is_selected("Doc1", "Box", "Face1", ResolveMode::OldStyleElement));
        assert!(hub.has_selection(None));
        assert!(hub.has_selection(Some("Doc1")));
        assert!(!hub.has_selection(Some("Doc2")));
    }

    #[test]
    fn duplicate_add_is_idempotent() {
        let hub = test_hub();
        assert!(hub.add_selection("Doc1", "Box", "Face1", PickPoint::zero(), None, false));
        assert!(hub.add_selection("Doc1", "Box", "Face1", PickPoint::zero(), None, false));
        assert_eq!(hub.selection(Some("*"), ResolveMode::NoResolve).len(), 1);
    }

    #[test]
    fn unresolvable_reference_is_silently_skipped() {
        let hub = test_hub();
        assert!(!hub.add_selection("Doc1", "Missing", "", PickPoint::zero(), None, false));
        assert!(!hub.add_selection("Nowhere", "Box", "", PickPoint::zero(), None, false));
        assert!(!hub.has_selection(None));
    }

    #[test]
    fn resolve_reference_surfaces_errors() {
        let hub = test_hub();
        let err = hub
            .resolve_reference("Doc1", "Missing", "", ResolveMode::OldStyleElement)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn context_stack_with_extended_fallback() {
        let hub = test_hub();
        assert!(hub.context(false).is_none());
        assert!(hub.context(true).is_none());

        hub.add_selection("Doc1", "Box", "Face1", PickPoint::zero(), None, false);
        assert!(hub.context(false).is_none());
        assert_eq!(hub.context(true).unwrap().sub_element, "Face1");

        hub.push_context(SelectionRef::new("Doc1", "Box", "Edge3"));
        assert_eq!(hub.context(false).unwrap().sub_element, "Edge3");
        assert_eq!(hub.pop_context().unwrap().sub_element, "Edge3");
    }

    #[test]
    fn replay_guard_nests() {
        let hub = test_hub();
        {
            let _outer = hub.suppress_replay_log();
            {
                let _inner = hub.suppress_replay_log();
            }
            assert_eq!(hub.state.lock().replay_disabled, 1);
        }
        assert_eq!(hub.state.lock().replay_disabled, 0);
    }

    #[test]
    fn global_accessor_initializes_lazily() {
        let hub = selection_hub();
        assert_eq!(hub.subscriber_count(), 0);
        // A second init must hand the hub back.
        let spare = SelectionHub::new(Arc::new(MemoryModel::new()));
        assert!(init_selection_hub(spare).is_err());
    }
}
