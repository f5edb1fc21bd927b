//! Runtime abstraction layer.
//!
//! The pool itself only needs a mutex, a wake-up event and (for handles
//! dropped without an explicit release) a way to spawn a detached task.
//! Everything else goes through Tokio directly in the dialers.

use std::future::Future;

// =============================================================================
// Sync Primitives
// =============================================================================

/// A runtime-agnostic async mutex.
///
/// Uses `async-lock` so a contended lock never blocks a worker thread.
pub use async_lock::Mutex as AsyncMutex;

/// Guard returned by [`AsyncMutex::lock`].
pub use async_lock::MutexGuard as AsyncMutexGuard;

/// A runtime-agnostic event notification mechanism.
///
/// Used to wake a draining `disconnect()` when in-flight connections come back.
pub use event_listener::Event as Notify;

// =============================================================================
// Spawn Abstraction
// =============================================================================

/// Spawn a future on the ambient Tokio runtime, if there is one.
///
/// Returns `false` when called outside a runtime; the future is dropped.
pub fn try_spawn<F>(future: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
            true
        }
        Err(_) => false,
    }
}

// =============================================================================
// Sleep Abstraction
// =============================================================================

/// Sleep for the given duration.
pub async fn sleep(duration: std::time::Duration) {
    tokio::time::sleep(duration).await;
}
