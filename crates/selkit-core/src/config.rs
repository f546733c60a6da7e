//! Engine configuration
//!
//! Tunables for notification coalescing, history depth, and coordinate
//! display. All values have working defaults; hosts that persist
//! preferences serialize this struct as a section of their own settings.

use serde::{Deserialize, Serialize};

use crate::units::MeasurementSystem;

/// The recursion ceiling may be configured upward but never below this.
pub const MIN_RECURSION_CEILING: usize = 1000;

/// Configuration for the selection engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Incremental add/remove notifications per drain cycle before the
    /// pending tail collapses into a single full-resync message.
    pub collapse_threshold: usize,
    /// Hard cap on messages enqueued within one drain cycle; beyond it
    /// messages are dropped with a single warning. Clamped to at least
    /// [`MIN_RECURSION_CEILING`].
    pub recursion_ceiling: usize,
    /// Maximum number of snapshots kept on the history back-stack.
    pub stack_capacity: usize,
    /// Whether committed mutations push history snapshots automatically.
    pub record_history: bool,
    /// Capacity of the broadcast channel serving async observers.
    pub channel_capacity: usize,
    /// Measurement system used when formatting pick coordinates.
    pub measurement_system: MeasurementSystem,
    /// Decimal places used by the raw-precision coordinate display.
    pub raw_decimals: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            collapse_threshold: 100,
            recursion_ceiling: MIN_RECURSION_CEILING,
            stack_capacity: 30,
            record_history: true,
            channel_capacity: 256,
            measurement_system: MeasurementSystem::default(),
            raw_decimals: 6,
        }
    }
}

impl SelectionConfig {
    /// Return the configuration with out-of-range values clamped.
    pub fn normalized(mut self) -> Self {
        self.recursion_ceiling = self.recursion_ceiling.max(MIN_RECURSION_CEILING);
        self.collapse_threshold = self.collapse_threshold.max(1);
        self.stack_capacity = self.stack_capacity.max(1);
        self.channel_capacity = self.channel_capacity.max(1);
        self
    }
}
