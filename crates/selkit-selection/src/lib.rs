//! # Selkit Selection
//!
//! Ordered, observable selection and preselection engine for CAD-style
//! document models: a process-wide registry of (document, object,
//! sub-element) references with gated adds, coalesced change
//! notification, browser-style history navigation, and a resolution
//! protocol between raw sub-element paths and resolved objects.
//!
//! The engine consumes the host's document model, view layer, and
//! status surfaces through the contracts in `selkit-core`; nothing here
//! owns document data.

pub mod container;
pub mod context;
pub mod events;
pub mod format;
pub mod gate;
pub mod guards;
pub mod hub;
pub mod preselect;
pub mod record;
pub mod resolve;
pub mod router;
pub mod stack;

pub use container::SelectionContainer;

pub use context::ContextStack;

pub use events::{ChangeFilter, ChangeKind, SelectionChange};

pub use format::format_status;

pub use gate::SelectionGate;

pub use guards::{NotificationPauseGuard, ReplayLogPauseGuard, TopParentCheckGuard};

pub use hub::{init_selection_hub, selection_hub, SelectionHub, VisibilityMode};

pub use preselect::{PreselectResult, PreselectSource, PreselectionState};

pub use record::{ElementName, SelectionGroup, SelectionRecord, SelectionRef};

pub use resolve::{check_selection, CheckedRef, Presence, ResolveMode};

pub use router::{ChangeHandler, NotificationRouter, SubscriptionId};

pub use stack::{SelectionSnapshot, SelectionStack};

// Re-export the core contracts alongside the engine for convenience.
pub use selkit_core::{
    DocumentModel, Error, FileReplayLog, HostSurface, MeasurementSystem, MemoryModel,
    MemoryReplayLog, PickPoint, ReplayLog, ResolveError, Result, SelectionConfig, ViewBridge,
};
