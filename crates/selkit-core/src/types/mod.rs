//! Shared type aliases.

mod aliases;

pub use aliases::{ThreadSafe, ThreadSafeMap, ThreadSafeRw, ThreadSafeRwMap};
