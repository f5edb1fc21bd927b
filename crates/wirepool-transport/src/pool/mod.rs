//! Connection pooling for a single endpoint.
//!
//! A [`Pool`] keeps reusable connections to one address, hands them out as
//! [`Handle`]s and tears everything down on [`Pool::disconnect`].
//!
//! # Features
//!
//! - Bounded idle store, most recently returned connection reused first
//! - Generation counter: connections from before a reconnect are never reused
//! - Idle timeout and maximum lifetime eviction
//! - Optional cap on simultaneously open connections
//! - Idempotent release and close through [`Handle`]
//! - Deadline-aware shutdown that force-closes stragglers
//!
//! # Example
//!
//! ```rust
//! use wirepool_transport::pool::PoolConfig;
//! use std::time::Duration;
//!
//! let config = PoolConfig::new()
//!     .capacity(10)
//!     .idle_timeout(Duration::from_secs(300))
//!     .max_open(Some(64));
//!
//! assert_eq!(config.capacity, 10);
//! assert_eq!(config.max_open, Some(64));
//! ```

mod config;
mod connection;
mod handle;
mod manager;
mod stats;

// Re-export public types
pub use config::{DEFAULT_CAPACITY, PoolConfig};
pub use connection::{PooledConnection, TransportGuard};
pub use handle::Handle;
pub use manager::Pool;
pub use stats::PoolStats;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::Deadline;
    use crate::traits::{Dialer, RawTransport, dialer_fn};
    use pretty_assertions::assert_eq;
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wirepool_core::{Address, ContextError, PoolError, PoolState, TransportError};

    #[derive(Debug, Default)]
    struct Tally {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    impl Tally {
        fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    struct Counted {
        tally: Arc<Tally>,
    }

    impl RawTransport for Counted {
        async fn close(&mut self) -> Result<(), TransportError> {
            self.tally.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingDialer(Arc<Tally>);

    impl Dialer for CountingDialer {
        type Transport = Counted;

        fn dial(
            &self,
            _address: &Address,
            _deadline: &Deadline,
        ) -> impl Future<Output = Result<Counted, TransportError>> + Send {
            self.0.opened.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(Counted {
                tally: Arc::clone(&self.0),
            }))
        }
    }

    /// A transport whose close takes a while.
    struct SlowClose {
        tally: Arc<Tally>,
        delay: Duration,
    }

    impl RawTransport for SlowClose {
        async fn close(&mut self) -> Result<(), TransportError> {
            tokio::time::sleep(self.delay).await;
            self.tally.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct SlowCloseDialer {
        tally: Arc<Tally>,
        delay: Duration,
    }

    impl Dialer for SlowCloseDialer {
        type Transport = SlowClose;

        fn dial(
            &self,
            _address: &Address,
            _deadline: &Deadline,
        ) -> impl Future<Output = Result<SlowClose, TransportError>> + Send {
            self.tally.opened.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(SlowClose {
                tally: Arc::clone(&self.tally),
                delay: self.delay,
            }))
        }
    }

    async fn slow_close_pool(
        config: PoolConfig,
        delay: Duration,
    ) -> (Pool<SlowCloseDialer>, Arc<Tally>) {
        let tally = Arc::new(Tally::default());
        let dialer = SlowCloseDialer {
            tally: Arc::clone(&tally),
            delay,
        };
        let pool = Pool::with_config("db:27017", config, dialer);
        pool.connect().await.unwrap();
        (pool, tally)
    }

    async fn connected_pool(config: PoolConfig) -> (Pool<CountingDialer>, Arc<Tally>) {
        let tally = Arc::new(Tally::default());
        let pool = Pool::with_config("db:27017", config, CountingDialer(Arc::clone(&tally)));
        pool.connect().await.unwrap();
        (pool, tally)
    }

    fn soon() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_reuses_single_transport() {
        let (pool, tally) = connected_pool(PoolConfig::new().capacity(2)).await;

        let mut ids = Vec::new();
        for _ in 0..5 {
            let handle = pool.get(&soon()).await.unwrap();
            ids.push(handle.id());
            handle.release().await.unwrap();
        }

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(tally.opened(), 1);
        assert_eq!(tally.closed(), 0);

        let stats = pool.stats().await;
        assert_eq!(stats.checkouts, 5);
        assert_eq!(stats.returns, 5);
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.in_use, 0);
    }

    #[tokio::test]
    async fn test_returns_beyond_capacity_are_closed() {
        let (pool, tally) = connected_pool(PoolConfig::new().capacity(1)).await;

        let a = pool.get(&soon()).await.unwrap();
        let b = pool.get(&soon()).await.unwrap();
        let c = pool.get(&soon()).await.unwrap();
        a.release().await.unwrap();
        b.release().await.unwrap();
        c.release().await.unwrap();

        assert_eq!(tally.opened(), 3);
        assert_eq!(tally.closed(), 2);
        assert_eq!(pool.stats().await.idle, 1);
    }

    #[tokio::test]
    async fn test_most_recently_returned_is_reused_first() {
        let (pool, _tally) = connected_pool(PoolConfig::new().capacity(4)).await;

        let a = pool.get(&soon()).await.unwrap();
        let b = pool.get(&soon()).await.unwrap();
        let (a_id, b_id) = (a.id(), b.id());
        a.release().await.unwrap();
        b.release().await.unwrap();

        let next = pool.get(&soon()).await.unwrap();
        assert_eq!(next.id(), b_id);
        let after = pool.get(&soon()).await.unwrap();
        assert_eq!(after.id(), a_id);
    }

    #[tokio::test]
    async fn test_idle_timeout_evicts_before_dialing() {
        let config = PoolConfig::new()
            .capacity(4)
            .idle_timeout(Duration::from_millis(10));
        let (pool, tally) = connected_pool(config).await;

        let first = pool.get(&soon()).await.unwrap();
        let first_id = first.id();
        first.release().await.unwrap();

        tokio::time::sleep(Duration::from_millis(15)).await;

        let second = pool.get(&soon()).await.unwrap();
        assert_ne!(second.id(), first_id);
        assert_eq!(tally.opened(), 2);
        assert_eq!(tally.closed(), 1);
        assert_eq!(pool.stats().await.evicted_idle, 1);
    }

    #[tokio::test]
    async fn test_max_lifetime_closes_on_return() {
        let config = PoolConfig::new()
            .capacity(4)
            .max_lifetime(Some(Duration::from_millis(5)));
        let (pool, tally) = connected_pool(config).await;

        let handle = pool.get(&soon()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.release().await.unwrap();

        assert_eq!(tally.closed(), 1);
        assert_eq!(pool.stats().await.idle, 0);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_are_not_repeatable() {
        let tally = Arc::new(Tally::default());
        let pool = Pool::new("db:27017", 4, CountingDialer(tally));
        assert_eq!(pool.generation().await, 0);

        pool.connect().await.unwrap();
        assert_eq!(pool.generation().await, 1);
        assert!(matches!(pool.connect().await, Err(PoolError::AlreadyConnected)));
        assert!(matches!(pool.connect().await, Err(PoolError::AlreadyConnected)));

        pool.disconnect(&soon()).await.unwrap();
        assert!(matches!(
            pool.disconnect(&soon()).await,
            Err(PoolError::AlreadyDisconnected)
        ));
        assert_eq!(pool.state().await, PoolState::Disconnected);

        pool.connect().await.unwrap();
        assert_eq!(pool.generation().await, 2);
    }

    #[tokio::test]
    async fn test_get_requires_connected_pool() {
        let tally = Arc::new(Tally::default());
        let pool = Pool::new("db:27017", 4, CountingDialer(Arc::clone(&tally)));

        assert!(matches!(pool.get(&soon()).await, Err(PoolError::Disconnected)));

        pool.connect().await.unwrap();
        pool.disconnect(&soon()).await.unwrap();
        assert!(matches!(pool.get(&soon()).await, Err(PoolError::Disconnected)));
        assert_eq!(tally.opened(), 0);
    }

    #[tokio::test]
    async fn test_foreign_connection_is_rejected() {
        let (pool_a, _) = connected_pool(PoolConfig::new()).await;
        let (pool_b, tally_b) = connected_pool(PoolConfig::new()).await;

        let handle = pool_a.get(&soon()).await.unwrap();
        let before = pool_b.stats().await;

        assert!(matches!(
            pool_b.put(handle.connection()).await,
            Err(PoolError::WrongPool)
        ));
        assert!(matches!(
            pool_b.close(handle.connection()).await,
            Err(PoolError::WrongPool)
        ));

        assert_eq!(pool_b.stats().await, before);
        assert_eq!(tally_b.closed(), 0);
        assert_eq!(pool_a.stats().await.in_use, 1);
        assert!(!handle.connection().is_closed());
    }

    #[tokio::test]
    async fn test_double_release_is_a_noop() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        let handle = pool.get(&soon()).await.unwrap();
        handle.release().await.unwrap();
        handle.release().await.unwrap();
        handle.close().await.unwrap();
        pool.put(handle.connection()).await.unwrap();

        let stats = pool.stats().await;
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.returns, 1);
        assert_eq!(tally.closed(), 0);
    }

    #[tokio::test]
    async fn test_close_discards_connection() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        let handle = pool.get(&soon()).await.unwrap();
        handle.close().await.unwrap();
        handle.close().await.unwrap();
        handle.release().await.unwrap();

        assert_eq!(tally.closed(), 1);
        assert!(handle.transport().await.is_none());
        let stats = pool.stats().await;
        assert_eq!(stats.idle, 0);
        assert_eq!(stats.in_use, 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_forces_close() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        let held = pool.get(&soon()).await.unwrap();
        pool.disconnect(&Deadline::after(Duration::ZERO)).await.unwrap();

        assert_eq!(tally.closed(), 1);
        assert!(held.connection().is_closed());
        assert_eq!(pool.stats().await.force_closed, 1);

        held.close().await.unwrap();
        assert_eq!(tally.closed(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_waits_for_release() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        let idle = pool.get(&soon()).await.unwrap();
        let held = pool.get(&soon()).await.unwrap();
        idle.release().await.unwrap();

        let releaser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            held.release().await.unwrap();
        });

        pool.disconnect(&soon()).await.unwrap();
        releaser.await.unwrap();

        assert_eq!(tally.closed(), 2);
        let stats = pool.stats().await;
        assert_eq!(stats.force_closed, 0);
        assert_eq!(stats.state, PoolState::Disconnected);
    }

    #[tokio::test]
    async fn test_stale_handle_after_reconnect() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        let old = pool.get(&soon()).await.unwrap();
        assert_eq!(old.generation(), 1);
        pool.disconnect(&Deadline::after(Duration::ZERO)).await.unwrap();
        pool.connect().await.unwrap();

        old.release().await.unwrap();
        assert_eq!(pool.stats().await.idle, 0);

        let fresh = pool.get(&soon()).await.unwrap();
        assert_eq!(fresh.generation(), 2);
        assert_ne!(fresh.id(), old.id());
        assert_eq!(tally.opened(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_get_does_not_dial() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        let deadline = Deadline::none();
        deadline.cancel();

        let err = pool.get(&deadline).await.unwrap_err();
        assert_eq!(err.as_context(), Some(ContextError::Cancelled));
        assert_eq!(tally.opened(), 0);
        assert_eq!(pool.stats().await.in_use, 0);
    }

    #[tokio::test]
    async fn test_dial_error_is_propagated() {
        let pool = Pool::new(
            "db:27017",
            4,
            dialer_fn(|_: Address, _: Deadline| async {
                Err::<Counted, TransportError>(TransportError::connection("connection refused"))
            }),
        );
        pool.connect().await.unwrap();

        let err = pool.get(&soon()).await.unwrap_err();
        assert!(matches!(
            err,
            PoolError::Transport(TransportError::Connection { ref message, .. })
                if message == "connection refused"
        ));

        let stats = pool.stats().await;
        assert_eq!(stats.dial_failures, 1);
        assert_eq!(stats.in_use, 0);
    }

    #[tokio::test]
    async fn test_deadline_abandons_slow_dial() {
        let tally = Arc::new(Tally::default());
        let dial_tally = Arc::clone(&tally);
        let pool = Pool::new(
            "db:27017",
            4,
            dialer_fn(move |_: Address, _: Deadline| {
                let tally = Arc::clone(&dial_tally);
                async move {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    tally.opened.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TransportError>(Counted { tally })
                }
            }),
        );
        pool.connect().await.unwrap();

        let err = pool
            .get(&Deadline::after(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert_eq!(err.as_context(), Some(ContextError::DeadlineExceeded));
        assert_eq!(tally.opened(), 0);
        assert_eq!(pool.stats().await.dial_failures, 0);
    }

    #[tokio::test]
    async fn test_dial_finishing_after_disconnect_is_closed() {
        let tally = Arc::new(Tally::default());
        let dial_tally = Arc::clone(&tally);
        let pool = Pool::new(
            "db:27017",
            4,
            dialer_fn(move |_: Address, _: Deadline| {
                let tally = Arc::clone(&dial_tally);
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    tally.opened.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TransportError>(Counted { tally })
                }
            }),
        );
        pool.connect().await.unwrap();

        let getter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.get(&Deadline::none()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        pool.disconnect(&soon()).await.unwrap();

        assert!(matches!(getter.await.unwrap(), Err(PoolError::Disconnected)));
        assert_eq!(tally.opened(), 1);
        assert_eq!(tally.closed(), 1);
        assert_eq!(pool.stats().await.in_use, 0);
    }

    #[tokio::test]
    async fn test_max_open_reports_exhaustion() {
        let (pool, _tally) = connected_pool(PoolConfig::new().max_open(Some(1))).await;

        let held = pool.get(&soon()).await.unwrap();
        assert!(matches!(
            pool.get(&soon()).await,
            Err(PoolError::Exhausted { open: 1, max: 1 })
        ));

        held.release().await.unwrap();
        assert!(pool.get(&soon()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_handle_returns_to_pool() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;

        drop(pool.get(&soon()).await.unwrap());

        for _ in 0..100 {
            if pool.stats().await.idle == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let stats = pool.stats().await;
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.in_use, 0);
        assert_eq!(tally.closed(), 0);
    }

    #[tokio::test]
    async fn test_get_dropped_during_eviction_keeps_nothing_checked_out() {
        let config = PoolConfig::new()
            .capacity(4)
            .max_lifetime(Some(Duration::from_millis(300)));
        let (pool, tally) = slow_close_pool(config, Duration::from_millis(300)).await;

        // `old` expires in the idle store on top of a still valid `fresh`.
        let old = pool.get(&soon()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let fresh = pool.get(&soon()).await.unwrap();
        let fresh_id = fresh.id();
        fresh.release().await.unwrap();
        old.release().await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        let abandoned = tokio::time::timeout(Duration::from_millis(50), pool.get(&soon())).await;
        assert!(abandoned.is_err(), "get should still be closing the expired connection");

        for _ in 0..100 {
            if pool.stats().await.in_use == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let stats = pool.stats().await;
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.idle, 1);

        let reused = pool.get(&soon()).await.unwrap();
        assert_eq!(reused.id(), fresh_id);
        reused.release().await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), pool.disconnect(&Deadline::none()))
            .await
            .expect("disconnect hung on an orphaned checkout")
            .unwrap();
        assert_eq!(tally.opened(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_waits_for_closes_started_by_get() {
        let config = PoolConfig::new()
            .capacity(4)
            .max_lifetime(Some(Duration::from_millis(20)));
        let (pool, tally) = slow_close_pool(config, Duration::from_millis(100)).await;

        let handle = pool.get(&soon()).await.unwrap();
        handle.release().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let getter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.get(&Deadline::none()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.stats().await.idle, 0);

        pool.disconnect(&Deadline::none()).await.unwrap();
        assert_eq!(tally.closed(), 1, "expired connection must be closed first");

        assert!(matches!(getter.await.unwrap(), Err(PoolError::Disconnected)));
        assert_eq!(tally.closed(), 2);
    }

    #[tokio::test]
    async fn test_forced_close_does_not_wait_for_transport_guard() {
        let (pool, tally) = connected_pool(PoolConfig::new()).await;
        let handle = pool.get(&soon()).await.unwrap();

        let guard = handle.transport().await.unwrap();
        tokio::time::timeout(
            Duration::from_millis(500),
            pool.disconnect(&Deadline::after(Duration::ZERO)),
        )
        .await
        .expect("disconnect waited for the transport guard")
        .unwrap();
        assert_eq!(pool.state().await, PoolState::Disconnected);
        assert!(handle.connection().is_closed());
        assert_eq!(pool.stats().await.force_closed, 1);

        drop(guard);
        for _ in 0..100 {
            if tally.closed() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(tally.closed(), 1);
        assert!(handle.transport().await.is_none());
        handle.close().await.unwrap();
        assert_eq!(tally.closed(), 1);
    }
}
