//! Type aliases for commonly used complex types.
//!
//! Gives meaningful names to the lock-wrapped shapes used across the
//! engine, so that the locking discipline is visible at a glance and the
//! underlying lock implementation can change in one place.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for shared state.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe, reader-writer-locked wrapper for read-mostly state.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// A thread-safe map for cross-thread key-value storage.
pub type ThreadSafeMap<K, V> = Arc<Mutex<HashMap<K, V>>>;

/// A thread-safe, reader-writer-locked map for read-mostly registries.
pub type ThreadSafeRwMap<K, V> = Arc<RwLock<HashMap<K, V>>>;
