//! Notification router
//!
//! Delivers [`SelectionChange`] messages to registered observers through
//! an explicit Idle/Notifying/Paused state machine instead of relying on
//! call-stack depth: a change arriving while a drain is already running
//! (a re-entrant call from inside an observer) or while notifications
//! are paused is queued with coalescing, and dispatched when the running
//! drain reaches it.
//!
//! Coalescing rules:
//! - a clear/resync message discards the queued tail it makes moot
//!   (same document scope, or everything when unscoped),
//! - once the per-cycle incremental counter reaches the collapse
//!   threshold, the pending add/remove tail is folded into a single
//!   full-resync message and further incrementals in the cycle are
//!   dropped,
//! - a hard recursion ceiling drops messages with a single warning.
//!
//! Locks are never held while observer callbacks run; handlers are
//! collected under the registry lock and invoked after release, which
//! is what makes synchronous re-entrancy from observers safe.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use selkit_core::{Error, ThreadSafeRwMap};

use crate::events::{ChangeFilter, ChangeKind, SelectionChange};

/// Subscription handle for unsubscribing from changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Type alias for observer handler functions
pub type ChangeHandler = Arc<dyn Fn(&SelectionChange) -> Result<(), Error> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Notifying,
}

#[derive(Debug)]
struct RouterState {
    phase: Phase,
    pause_depth: usize,
    queue: VecDeque<SelectionChange>,
    cycle_incremental: usize,
    cycle_total: usize,
    collapsed: bool,
    warned: bool,
}

impl RouterState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pause_depth: 0,
            queue: VecDeque::new(),
            cycle_incremental: 0,
            cycle_total: 0,
            collapsed: false,
            warned: false,
        }
    }

    fn begin_cycle(&mut self) {
        self.phase = Phase::Notifying;
        self.cycle_incremental = 0;
        self.cycle_total = 0;
        self.collapsed = false;
        self.warned = false;
    }
}

/// Router for selection change distribution
pub struct NotificationRouter {
    /// Broadcast channel sender for async receivers
    sender: broadcast::Sender<SelectionChange>,
    /// Registered synchronous handlers
    handlers: ThreadSafeRwMap<SubscriptionId, (ChangeFilter, ChangeHandler)>,
    /// Queue and state machine
    state: Mutex<RouterState>,
    collapse_threshold: usize,
    recursion_ceiling: usize,
}

impl NotificationRouter {
    /// Create a router with the given coalescing parameters.
    pub fn new(collapse_threshold: usize, recursion_ceiling: usize, channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        Self {
            sender,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            state: Mutex::new(RouterState::new()),
            collapse_threshold,
            recursion_ceiling,
        }
    }

    /// Subscribe to changes with a synchronous handler
    ///
    /// The handler runs on the notifying thread during queue drain; a
    /// returned error is logged at the drain site and does not abort the
    /// drain. Handlers may call back into the selection engine.
    pub fn subscribe<F>(&self, filter: ChangeFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&SelectionChange) -> Result<(), Error> + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Arc::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Unsubscribe from changes
    ///
    /// Returns true if the subscription was found and removed. An
    /// observer must detach itself before its captured state goes away.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Get a receiver for async change consumption
    pub fn receiver(&self) -> broadcast::Receiver<SelectionChange> {
        self.sender.subscribe()
    }

    /// Enter a pause scope; queued messages accumulate until resume.
    pub fn pause(&self) {
        self.state.lock().pause_depth += 1;
    }

    /// Leave a pause scope.
    ///
    /// Returns true when this was the outermost scope and a queued
    /// message is waiting, i.e. the caller should flush.
    pub fn resume(&self) -> bool {
        let mut rs = self.state.lock();
        rs.pause_depth = rs.pause_depth.saturating_sub(1);
        rs.pause_depth == 0 && !rs.queue.is_empty()
    }

    /// Whether a pause scope is active.
    pub fn is_paused(&self) -> bool {
        self.state.lock().pause_depth > 0
    }

    /// Number of queued, undelivered messages.
    pub fn queued_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Route one change.
    ///
    /// `live` re-validates a queued message against current state right
    /// before dispatch; messages that are no longer true are dropped.
    pub fn notify(&self, change: SelectionChange, live: &dyn Fn(&SelectionChange) -> bool) {
        {
            let mut rs = self.state.lock();
            if rs.pause_depth > 0 || rs.phase == Phase::Notifying {
                self.enqueue(&mut rs, change);
                return;
            }
            rs.begin_cycle();
            rs.queue.push_back(change);
        }
        self.drain(live);
    }

    /// Start a drain for messages queued while paused.
    ///
    /// Returns true when anything was dispatched.
    pub fn flush(&self, live: &dyn Fn(&SelectionChange) -> bool) -> bool {
        {
            let mut rs = self.state.lock();
            if rs.phase != Phase::Idle || rs.pause_depth > 0 || rs.queue.is_empty() {
                return false;
            }
            rs.begin_cycle();
        }
        self.drain(live);
        true
    }

    fn drain(&self, live: &dyn Fn(&SelectionChange) -> bool) {
        loop {
            let next = {
                let mut rs = self.state.lock();
                if rs.pause_depth > 0 {
                    // A handler opened a pause scope mid-drain; leave
                    // the rest queued for the closing flush.
                    None
                } else {
                    rs.queue.pop_front()
                }
            };
            let Some(change) = next else { break };
            if live(&change) {
                self.dispatch(&change);
            } else {
                tracing::debug!("dropping stale change: {}", change.description());
            }
        }
        self.state.lock().phase = Phase::Idle;
    }

    fn enqueue(&self, rs: &mut RouterState, change: SelectionChange) {
        rs.cycle_total += 1;
        if rs.cycle_total > self.recursion_ceiling {
            if !rs.warned {
                tracing::warn!(
                    "selection notification ceiling ({}) exceeded; dropping messages",
                    self.recursion_ceiling
                );
                rs.warned = true;
            }
            return;
        }

        match change.kind() {
            ChangeKind::Cleared | ChangeKind::Replaced => {
                let scope = change.document_scope().map(str::to_string);
                while rs
                    .queue
                    .back()
                    .is_some_and(|m| m.superseded_by_scope(scope.as_deref()))
                {
                    rs.queue.pop_back();
                }
                rs.queue.push_back(change);
            }
            _ if change.is_incremental() => {
                if rs.collapsed {
                    return;
                }
                rs.cycle_incremental += 1;
                if rs.cycle_incremental >= self.collapse_threshold {
                    rs.queue.retain(|m| !m.is_incremental());
                    rs.queue
                        .push_back(SelectionChange::Replaced { document: None });
                    rs.collapsed = true;
                } else {
                    rs.queue.push_back(change);
                }
            }
            _ => rs.queue.push_back(change),
        }
    }

    fn dispatch(&self, change: &SelectionChange) {
        // Snapshot matching handlers so no lock is held while observer
        // code runs; handlers may (un)subscribe or re-enter the engine.
        let handlers: Vec<(SubscriptionId, ChangeHandler)> = {
            let map = self.handlers.read();
            map.iter()
                .filter(|(_, (filter, _))| filter.matches(change))
                .map(|(id, (_, handler))| (*id, Arc::clone(handler)))
                .collect()
        };
        for (id, handler) in handlers {
            if let Err(err) = handler(change) {
                tracing::warn!("selection observer {} failed: {}", id, err);
            }
        }
        // Fan out to async receivers; no receivers is not an error.
        let _ = self.sender.send(change.clone());
    }
}

impl std::fmt::Debug for NotificationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRouter")
            .field("subscribers", &self.subscriber_count())
            .field("queued", &self.queued_len())
            .finish()
    }
}
