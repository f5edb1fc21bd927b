//! Connection pool manager implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use futures::future::join_all;
use tracing::{debug, trace, warn};
use wirepool_core::{Address, PoolError, PoolState};

use crate::deadline::Deadline;
use crate::runtime::{AsyncMutex, Notify};
use crate::telemetry::POOL_TARGET;
use crate::traits::Dialer;

use super::config::PoolConfig;
use super::connection::PooledConnection;
use super::handle::Handle;
use super::stats::{Counters, PoolStats};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// State guarded by the pool mutex. Never held across I/O.
struct Shared<T> {
    state: PoolState,
    generation: u64,
    /// Reusable connections; the most recently returned is last.
    idle: Vec<PooledConnection<T>>,
    /// Checked-out connections by ID.
    inflight: HashMap<u64, PooledConnection<T>>,
}

impl<T> Shared<T> {
    fn transition(&mut self, next: PoolState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal pool transition {} -> {next}",
            self.state
        );
        self.state = next;
    }
}

/// Why a connection is being physically closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposal {
    StaleGeneration,
    IdleTimeout,
    LifetimeExceeded,
    IdleStoreFull,
    PoolNotConnected,
    Forced,
    Explicit,
}

impl Disposal {
    const fn as_str(self) -> &'static str {
        match self {
            Self::StaleGeneration => "stale generation",
            Self::IdleTimeout => "idle timeout",
            Self::LifetimeExceeded => "lifetime exceeded",
            Self::IdleStoreFull => "idle store full",
            Self::PoolNotConnected => "pool not connected",
            Self::Forced => "forced by disconnect",
            Self::Explicit => "closed by caller",
        }
    }
}

struct Inner<D: Dialer> {
    id: u64,
    address: Address,
    config: PoolConfig,
    dialer: D,
    shared: AsyncMutex<Shared<D::Transport>>,
    /// Signalled whenever an in-flight connection leaves the pool.
    drained: Notify,
    /// Connections removed from `inflight` whose close has not finished.
    closing: AtomicUsize,
    /// Dials in progress, counted against `max_open`.
    dialing: AtomicUsize,
    next_conn_id: AtomicU64,
    counters: Counters,
}

/// Decrements a counter (and wakes drain waiters) when dropped, so a
/// cancelled future cannot leave it raised.
struct Pending<'a> {
    counter: &'a AtomicUsize,
    amount: usize,
    drained: Option<&'a Notify>,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.amount == 0 {
            return;
        }
        self.counter.fetch_sub(self.amount, Ordering::AcqRel);
        if let Some(drained) = self.drained {
            drained.notify(usize::MAX);
        }
    }
}

/// A bounded pool of connections to a single endpoint.
///
/// The pool is cheap to clone; clones share the same state.
///
/// # Lifecycle
///
/// A new pool is disconnected and holds nothing. [`connect`](Self::connect)
/// starts a new generation; [`get`](Self::get) hands out connections, dialing
/// when no idle one is usable; [`disconnect`](Self::disconnect) closes idle
/// connections at once and waits for checked-out ones until its deadline
/// fires, then closes the rest.
///
/// # Capacity
///
/// `capacity` bounds how many idle connections are kept for reuse, not how
/// many may be checked out. Returning a connection to a full idle store
/// closes it. Set [`PoolConfig::max_open`] to also bound checkouts.
pub struct Pool<D: Dialer> {
    inner: Arc<Inner<D>>,
}

impl<D: Dialer> Clone for Pool<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Dialer> Pool<D> {
    /// Create a disconnected pool retaining up to `capacity` idle connections.
    #[must_use]
    pub fn new(address: impl Into<Address>, capacity: usize, dialer: D) -> Self {
        Self::with_config(address, PoolConfig::new().capacity(capacity), dialer)
    }

    /// Create a disconnected pool with a full configuration.
    #[must_use]
    pub fn with_config(address: impl Into<Address>, config: PoolConfig, dialer: D) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
                address: address.into(),
                config,
                dialer,
                shared: AsyncMutex::new(Shared {
                    state: PoolState::Disconnected,
                    generation: 0,
                    idle: Vec::new(),
                    inflight: HashMap::new(),
                }),
                drained: Notify::new(),
                closing: AtomicUsize::new(0),
                dialing: AtomicUsize::new(0),
                next_conn_id: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        }
    }

    /// The endpoint this pool dials.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.inner.address
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// The dialer used for new connections.
    #[must_use]
    pub fn dialer(&self) -> &D {
        &self.inner.dialer
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> PoolState {
        self.inner.shared.lock().await.state
    }

    /// Current generation; 0 until the first successful connect.
    pub async fn generation(&self) -> u64 {
        self.inner.shared.lock().await.generation
    }

    /// Get current pool statistics.
    pub async fn stats(&self) -> PoolStats {
        let shared = self.inner.shared.lock().await;
        self.inner.counters.snapshot(
            shared.state,
            shared.generation,
            shared.idle.len(),
            shared.inflight.len(),
        )
    }

    /// Activate the pool and start a new generation.
    ///
    /// Fails with [`PoolError::AlreadyConnected`] every time it is called on
    /// a connected pool, and with [`PoolError::Disconnecting`] while a
    /// disconnect is still draining.
    pub async fn connect(&self) -> Result<(), PoolError> {
        let mut shared = self.inner.shared.lock().await;
        match shared.state {
            PoolState::Connected | PoolState::Connecting => {
                return Err(PoolError::AlreadyConnected);
            }
            PoolState::Disconnecting => return Err(PoolError::Disconnecting),
            PoolState::Disconnected => {}
        }

        shared.transition(PoolState::Connecting);
        shared.generation += 1;
        shared.idle = Vec::new();
        shared.inflight = HashMap::new();
        shared.transition(PoolState::Connected);

        debug!(
            target: POOL_TARGET,
            address = %self.inner.address,
            generation = shared.generation,
            "Pool connected"
        );
        Ok(())
    }

    /// Check out a connection.
    ///
    /// Reuses the most recently returned idle connection that is still
    /// valid, closing stale or expired ones on the way; otherwise dials a
    /// new one. The dial is abandoned as soon as `deadline` fires.
    ///
    /// Dialer and deadline errors are returned as-is. Nothing is registered
    /// on any failure path.
    pub async fn get(&self, deadline: &Deadline) -> Result<Handle<D>, PoolError> {
        let inner = &*self.inner;
        let mut evicted = Vec::new();
        let mut reused = None;
        let mut shared = inner.shared.lock().await;

        if !shared.state.is_connected() {
            return Err(PoolError::Disconnected);
        }
        deadline.check()?;

        let generation = shared.generation;
        while let Some(conn) = shared.idle.pop() {
            if let Some(reason) = self.idle_disposal(&conn, generation) {
                evicted.push((conn, reason));
                continue;
            }
            shared.inflight.insert(conn.id(), conn.clone());
            reused = Some(conn);
            break;
        }
        let closing = self.begin_close(evicted.len());

        if let Some(conn) = reused {
            // The handle owns the checkout before anything is awaited.
            let handle = Handle::new(self.clone(), conn);
            drop(shared);
            Counters::bump(&inner.counters.checkouts);
            trace!(
                target: POOL_TARGET,
                address = %inner.address,
                conn_id = handle.id(),
                generation,
                evicted = evicted.len(),
                "Reusing idle connection"
            );
            self.dispose_all(&evicted).await;
            drop(closing);
            return Ok(handle);
        }

        if let Some(max) = inner.config.max_open {
            let open = shared.inflight.len() + inner.dialing.load(Ordering::Acquire);
            if open >= max {
                drop(shared);
                self.dispose_all(&evicted).await;
                drop(closing);
                return Err(PoolError::Exhausted { open, max });
            }
        }

        inner.dialing.fetch_add(1, Ordering::AcqRel);
        let _dialing = Pending {
            counter: &inner.dialing,
            amount: 1,
            drained: None,
        };
        drop(shared);
        self.dispose_all(&evicted).await;
        drop(closing);

        debug!(
            target: POOL_TARGET,
            address = %inner.address,
            generation,
            "Dialing new connection"
        );
        let transport = match deadline
            .run(inner.dialer.dial(&inner.address, deadline))
            .await
        {
            Ok(Ok(transport)) => transport,
            Ok(Err(err)) => {
                Counters::bump(&inner.counters.dial_failures);
                debug!(
                    target: POOL_TARGET,
                    address = %inner.address,
                    error = %err,
                    "Dial failed"
                );
                return Err(err.into());
            }
            Err(err) => {
                debug!(
                    target: POOL_TARGET,
                    address = %inner.address,
                    error = %err,
                    "Dial abandoned"
                );
                return Err(err.into());
            }
        };

        Counters::bump(&inner.counters.created);
        let conn = PooledConnection::new(
            transport,
            inner.next_conn_id.fetch_add(1, Ordering::Relaxed),
            generation,
            inner.id,
        );

        let mut shared = inner.shared.lock().await;
        if !shared.state.is_connected() || shared.generation != generation {
            // A disconnect started while we were dialing.
            drop(shared);
            self.dispose(&conn, Disposal::PoolNotConnected).await;
            return Err(PoolError::Disconnected);
        }
        shared.inflight.insert(conn.id(), conn.clone());
        drop(shared);

        Counters::bump(&inner.counters.checkouts);
        trace!(
            target: POOL_TARGET,
            address = %inner.address,
            conn_id = conn.id(),
            generation,
            "Checked out new connection"
        );
        Ok(Handle::new(self.clone(), conn))
    }

    /// Return a connection for reuse.
    ///
    /// The connection goes back into the idle store unless the pool is not
    /// connected, the connection is from an older generation or past its
    /// lifetime, or the idle store is full; in those cases it is closed.
    ///
    /// Returning a connection that is not checked out (already returned,
    /// already closed, or reclaimed by a disconnect) does nothing.
    pub async fn put(&self, conn: &PooledConnection<D::Transport>) -> Result<(), PoolError> {
        let inner = &*self.inner;
        if conn.owner() != inner.id {
            return Err(PoolError::WrongPool);
        }

        let mut shared = inner.shared.lock().await;
        let Some(conn) = shared.inflight.remove(&conn.id()) else {
            trace!(
                target: POOL_TARGET,
                address = %inner.address,
                conn_id = conn.id(),
                "Connection already returned"
            );
            return Ok(());
        };

        let disposal = if !shared.state.is_connected() {
            Some(Disposal::PoolNotConnected)
        } else if conn.generation() != shared.generation {
            Some(Disposal::StaleGeneration)
        } else if conn.is_expired(inner.config.max_lifetime) {
            Some(Disposal::LifetimeExceeded)
        } else if shared.idle.len() >= inner.config.capacity {
            Some(Disposal::IdleStoreFull)
        } else {
            None
        };

        match disposal {
            None => {
                conn.touch();
                trace!(
                    target: POOL_TARGET,
                    address = %inner.address,
                    conn_id = conn.id(),
                    idle = shared.idle.len() + 1,
                    "Returned connection to idle store"
                );
                shared.idle.push(conn);
                drop(shared);
                Counters::bump(&inner.counters.returns);
            }
            Some(reason) => {
                let _closing = self.begin_close(1);
                drop(shared);
                self.dispose(&conn, reason).await;
            }
        }
        Ok(())
    }

    /// Close a checked-out connection instead of returning it.
    ///
    /// Same ownership check and idempotency as [`put`](Self::put), but the
    /// connection is never offered for reuse.
    pub async fn close(&self, conn: &PooledConnection<D::Transport>) -> Result<(), PoolError> {
        let inner = &*self.inner;
        if conn.owner() != inner.id {
            return Err(PoolError::WrongPool);
        }

        let mut shared = inner.shared.lock().await;
        let Some(conn) = shared.inflight.remove(&conn.id()) else {
            trace!(
                target: POOL_TARGET,
                address = %inner.address,
                conn_id = conn.id(),
                "Connection already closed"
            );
            return Ok(());
        };
        let _closing = self.begin_close(1);
        drop(shared);

        self.dispose(&conn, Disposal::Explicit).await;
        Ok(())
    }

    /// Tear the pool down.
    ///
    /// Idle connections are closed immediately. Checked-out connections are
    /// awaited until they are returned or `deadline` fires; once it has,
    /// every remaining one is closed without further waiting. Forced closes
    /// are not errors.
    ///
    /// A forced close never waits on a caller holding the connection's
    /// [`TransportGuard`](super::TransportGuard); the transport is shut once
    /// that guard is dropped.
    pub async fn disconnect(&self, deadline: &Deadline) -> Result<(), PoolError> {
        let inner = &*self.inner;
        let (idle, generation) = {
            let mut shared = inner.shared.lock().await;
            if shared.state != PoolState::Connected {
                return Err(PoolError::AlreadyDisconnected);
            }
            shared.transition(PoolState::Disconnecting);
            (std::mem::take(&mut shared.idle), shared.generation)
        };

        debug!(
            target: POOL_TARGET,
            address = %inner.address,
            generation,
            idle = idle.len(),
            "Disconnecting pool"
        );
        join_all(
            idle.iter()
                .map(|conn| self.dispose(conn, Disposal::PoolNotConnected)),
        )
        .await;

        loop {
            let listener = inner.drained.listen();
            let forced: Vec<_> = {
                let mut shared = inner.shared.lock().await;
                if shared.inflight.is_empty() && inner.closing.load(Ordering::Acquire) == 0 {
                    break;
                }
                if deadline.is_done() {
                    shared.inflight.drain().map(|(_, conn)| conn).collect()
                } else {
                    Vec::new()
                }
            };

            if !forced.is_empty() {
                warn!(
                    target: POOL_TARGET,
                    address = %inner.address,
                    generation,
                    count = forced.len(),
                    "Deadline expired, force-closing in-flight connections"
                );
                join_all(forced.iter().map(|conn| self.dispose(conn, Disposal::Forced))).await;
                continue;
            }

            if deadline.is_done() {
                // Only closes already under way remain; they always finish.
                listener.await;
            } else {
                tokio::select! {
                    () = listener => {}
                    _ = deadline.done() => {}
                }
            }
        }

        let mut shared = inner.shared.lock().await;
        shared.idle = Vec::new();
        shared.inflight = HashMap::new();
        shared.transition(PoolState::Disconnected);
        drop(shared);

        debug!(
            target: POOL_TARGET,
            address = %inner.address,
            generation,
            "Pool disconnected"
        );
        Ok(())
    }

    /// Why an idle connection must not be handed out, if it must not.
    fn idle_disposal(
        &self,
        conn: &PooledConnection<D::Transport>,
        generation: u64,
    ) -> Option<Disposal> {
        if conn.generation() != generation {
            Some(Disposal::StaleGeneration)
        } else if conn.is_idle(self.inner.config.idle_timeout) {
            Some(Disposal::IdleTimeout)
        } else if conn.is_expired(self.inner.config.max_lifetime) {
            Some(Disposal::LifetimeExceeded)
        } else {
            None
        }
    }

    /// Register `count` closes in progress. Must be called with the state
    /// lock held.
    fn begin_close(&self, count: usize) -> Pending<'_> {
        if count > 0 {
            self.inner.closing.fetch_add(count, Ordering::AcqRel);
        }
        Pending {
            counter: &self.inner.closing,
            amount: count,
            drained: Some(&self.inner.drained),
        }
    }

    async fn dispose_all(&self, conns: &[(PooledConnection<D::Transport>, Disposal)]) {
        if conns.is_empty() {
            return;
        }
        join_all(conns.iter().map(|(conn, reason)| self.dispose(conn, *reason))).await;
    }

    /// Physically close a connection that is no longer tracked.
    async fn dispose(&self, conn: &PooledConnection<D::Transport>, reason: Disposal) {
        let counters = &self.inner.counters;
        match conn.close().await {
            Ok(false) => return,
            Ok(true) => trace!(
                target: POOL_TARGET,
                address = %self.inner.address,
                conn_id = conn.id(),
                generation = conn.generation(),
                reason = reason.as_str(),
                "Closed connection"
            ),
            Err(err) => warn!(
                target: POOL_TARGET,
                address = %self.inner.address,
                conn_id = conn.id(),
                generation = conn.generation(),
                reason = reason.as_str(),
                error = %err,
                "Error closing connection"
            ),
        }

        Counters::bump(&counters.closed);
        match reason {
            Disposal::StaleGeneration => Counters::bump(&counters.evicted_stale),
            Disposal::IdleTimeout | Disposal::LifetimeExceeded => {
                Counters::bump(&counters.evicted_idle);
            }
            Disposal::Forced => Counters::bump(&counters.force_closed),
            Disposal::IdleStoreFull | Disposal::PoolNotConnected | Disposal::Explicit => {}
        }
    }
}

impl<D: Dialer> fmt::Debug for Pool<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.inner.id)
            .field("address", &self.inner.address)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
