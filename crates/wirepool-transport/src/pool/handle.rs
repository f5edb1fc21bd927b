//! Checkout handles.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;
use wirepool_core::PoolError;

use crate::runtime;
use crate::telemetry::POOL_TARGET;
use crate::traits::Dialer;

use super::connection::{PooledConnection, TransportGuard};
use super::manager::Pool;

/// A checked-out connection together with the pool it came from.
///
/// Call [`release`](Self::release) to return the connection for reuse, or
/// [`close`](Self::close) to discard it. Only the first of these calls has
/// any effect; later calls succeed without touching the pool.
///
/// A handle dropped without either is returned to the pool on a background
/// task when a Tokio runtime is available. Outside a runtime the connection
/// stays checked out until the pool disconnects.
pub struct Handle<D: Dialer> {
    pool: Pool<D>,
    conn: PooledConnection<D::Transport>,
    released: AtomicBool,
}

impl<D: Dialer> Handle<D> {
    pub(crate) fn new(pool: Pool<D>, conn: PooledConnection<D::Transport>) -> Self {
        Self {
            pool,
            conn,
            released: AtomicBool::new(false),
        }
    }

    /// The pooled connection behind this handle.
    #[must_use]
    pub fn connection(&self) -> &PooledConnection<D::Transport> {
        &self.conn
    }

    /// The pool this handle belongs to.
    #[must_use]
    pub fn pool(&self) -> &Pool<D> {
        &self.pool
    }

    /// Connection ID, unique within the pool.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.conn.id()
    }

    /// The generation the connection was dialed under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.conn.generation()
    }

    /// Whether `release` or `close` has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Lock the transport for I/O.
    ///
    /// Returns `None` if the connection was closed, for example by a
    /// disconnect whose deadline fired.
    pub async fn transport(&self) -> Option<TransportGuard<'_, D::Transport>> {
        self.conn.transport().await
    }

    /// Return the connection to the pool.
    pub async fn release(&self) -> Result<(), PoolError> {
        if self.released.swap(true, Ordering::AcqRel) {
            trace!(target: POOL_TARGET, conn_id = self.id(), "Handle already released");
            return Ok(());
        }
        self.pool.put(&self.conn).await
    }

    /// Close the connection instead of returning it.
    pub async fn close(&self) -> Result<(), PoolError> {
        if self.released.swap(true, Ordering::AcqRel) {
            trace!(target: POOL_TARGET, conn_id = self.id(), "Handle already released");
            return Ok(());
        }
        self.pool.close(&self.conn).await
    }
}

impl<D: Dialer> Drop for Handle<D> {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        let pool = self.pool.clone();
        let conn = self.conn.clone();
        let spawned = runtime::try_spawn(async move {
            if let Err(err) = pool.put(&conn).await {
                trace!(
                    target: POOL_TARGET,
                    conn_id = conn.id(),
                    error = %err,
                    "Dropped handle could not be returned"
                );
            }
        });
        if !spawned {
            trace!(
                target: POOL_TARGET,
                conn_id = self.conn.id(),
                "Handle dropped outside a runtime; connection left checked out"
            );
        }
    }
}

impl<D: Dialer> fmt::Debug for Handle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("connection", &self.conn)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
