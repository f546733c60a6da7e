//! # Selkit Core
//!
//! Core types, traits, and utilities for Selkit.
//! Provides the fundamental abstractions the selection engine builds on:
//! collaborator contracts for the host document model and view layer,
//! the error taxonomy, configuration, and unit handling.

pub mod bridge;
pub mod config;
pub mod error;
pub mod model;
pub mod types;
pub mod units;

pub use bridge::{
    FileReplayLog, HostSurface, MemoryReplayLog, NullHost, NullReplayLog, NullViewBridge,
    ReplayLog, ViewBridge,
};

pub use config::SelectionConfig;

pub use error::{Error, ResolveError, Result};

pub use model::{
    element_name, is_descendant_path, strip_element, DocumentModel, MemoryModel, PickPoint,
    ResolvedElement,
};

// Re-export type aliases for convenience
pub use types::{ThreadSafe, ThreadSafeMap, ThreadSafeRw, ThreadSafeRwMap};

pub use units::{format_length, format_length_raw, unit_label, MeasurementSystem};
