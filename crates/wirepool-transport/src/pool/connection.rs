//! Pooled connection wrapper types.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::warn;
use wirepool_core::TransportError;

use crate::runtime::{self, AsyncMutex, AsyncMutexGuard};
use crate::telemetry::POOL_TARGET;
use crate::traits::RawTransport;

/// Shared state of one pooled connection.
struct Slot<T> {
    id: u64,
    generation: u64,
    /// Identity of the pool that dialed this connection.
    owner: u64,
    created_at: Instant,
    /// Nanoseconds after `created_at` of the last return to the idle store.
    last_used: AtomicU64,
    /// `None` once the transport has been taken for closing.
    transport: AsyncMutex<Option<T>>,
    closed: AtomicBool,
}

/// A raw transport tagged with the pool generation it was dialed under.
///
/// Cloning yields another reference to the same connection; identity is
/// the `(pool, id)` pair.
pub struct PooledConnection<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for PooledConnection<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> PooledConnection<T> {
    pub(crate) fn new(transport: T, id: u64, generation: u64, owner: u64) -> Self {
        Self {
            slot: Arc::new(Slot {
                id,
                generation,
                owner,
                created_at: Instant::now(),
                last_used: AtomicU64::new(0),
                transport: AsyncMutex::new(Some(transport)),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Connection ID, unique within its pool.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.slot.id
    }

    /// The pool generation this connection was dialed under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot.generation
    }

    pub(crate) fn owner(&self) -> u64 {
        self.slot.owner
    }

    /// When the connection was dialed.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.slot.created_at
    }

    /// When the connection was last returned to the idle store.
    ///
    /// Equal to [`created_at`](Self::created_at) until the first return.
    #[must_use]
    pub fn last_used(&self) -> Instant {
        self.slot.created_at + Duration::from_nanos(self.slot.last_used.load(Ordering::Acquire))
    }

    /// Get the age of the connection.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.slot.created_at.elapsed()
    }

    /// Whether the transport has been physically closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.slot.closed.load(Ordering::Acquire)
    }

    /// Mark the connection as used now.
    pub(crate) fn touch(&self) {
        let nanos = u64::try_from(self.slot.created_at.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.slot.last_used.store(nanos, Ordering::Release);
    }

    /// Check if the connection has been idle at least `timeout`.
    ///
    /// A zero timeout never expires.
    #[must_use]
    pub fn is_idle(&self, timeout: Duration) -> bool {
        !timeout.is_zero() && self.last_used().elapsed() >= timeout
    }

    /// Check if the connection has exceeded its maximum lifetime.
    #[must_use]
    pub fn is_expired(&self, max_lifetime: Option<Duration>) -> bool {
        max_lifetime.is_some_and(|lifetime| self.age() >= lifetime)
    }

    /// Lock the underlying transport.
    ///
    /// Returns `None` once the connection has been closed. A guard taken
    /// before the close stays usable until dropped.
    pub async fn transport(&self) -> Option<TransportGuard<'_, T>> {
        let guard = self.slot.transport.lock().await;
        (guard.is_some() && !self.is_closed()).then_some(TransportGuard { guard })
    }
}

impl<T: RawTransport> PooledConnection<T> {
    /// Physically close the transport.
    ///
    /// Returns `Ok(false)` if it was already closed; only the first call
    /// touches the transport.
    ///
    /// Never waits for a held [`TransportGuard`]. In that case the close
    /// runs on a background task once the guard is dropped, or with the
    /// last reference to the connection outside a runtime.
    pub(crate) async fn close(&self) -> Result<bool, TransportError> {
        if self.slot.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let Some(mut guard) = self.slot.transport.try_lock() else {
            let slot = Arc::clone(&self.slot);
            runtime::try_spawn(async move {
                let transport = slot.transport.lock().await.take();
                if let Some(mut transport) = transport {
                    if let Err(err) = transport.close().await {
                        warn!(
                            target: POOL_TARGET,
                            conn_id = slot.id,
                            error = %err,
                            "Error closing connection after guard release"
                        );
                    }
                }
            });
            return Ok(true);
        };
        let transport = guard.take();
        drop(guard);
        match transport {
            Some(mut transport) => transport.close().await.map(|()| true),
            None => Ok(false),
        }
    }
}

impl<T> PartialEq for PooledConnection<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T> Eq for PooledConnection<T> {}

impl<T> fmt::Debug for PooledConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.slot.id)
            .field("generation", &self.slot.generation)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a pooled connection's transport.
pub struct TransportGuard<'a, T> {
    guard: AsyncMutexGuard<'a, Option<T>>,
}

impl<T> Deref for TransportGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.guard.as_ref() {
            Some(transport) => transport,
            None => unreachable!("transport taken while guarded"),
        }
    }
}

impl<T> DerefMut for TransportGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.guard.as_mut() {
            Some(transport) => transport,
            None => unreachable!("transport taken while guarded"),
        }
    }
}
