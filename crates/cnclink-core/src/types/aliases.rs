//! Type aliases for commonly used complex types.
//!
//! Callbacks are invoked from the transport's callback context as well as
//! the UI layer, so every shared type here is thread-safe.

use parking_lot::RwLock;
use std::sync::Arc;

/// A thread-safe read-write lock wrapper, for read-heavy shared lists.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

/// A shareable callback receiving a borrowed value.
pub type DataCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Wrap a value in `Arc<RwLock<T>>`.
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
