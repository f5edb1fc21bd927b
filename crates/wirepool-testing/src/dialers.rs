//! Instrumented and misbehaving dialers.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wirepool_core::{Address, TransportError};
use wirepool_transport::{Deadline, Dialer, MemoryDialer, RawTransport};

/// Dial and close counts shared between a [`TrackingDialer`] and its
/// transports.
#[derive(Debug, Default)]
pub struct DialLog {
    dialed: AtomicUsize,
    closed: AtomicUsize,
}

impl DialLog {
    /// Successful dials so far.
    #[must_use]
    pub fn dialed(&self) -> usize {
        self.dialed.load(Ordering::SeqCst)
    }

    /// Physical closes so far.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Transports dialed and not yet closed.
    #[must_use]
    pub fn open(&self) -> usize {
        self.dialed().saturating_sub(self.closed())
    }
}

/// A dialer that records every dial and close of the dialer it wraps.
///
/// Clones share the same [`DialLog`].
#[derive(Debug, Clone)]
pub struct TrackingDialer<D = MemoryDialer> {
    inner: D,
    log: Arc<DialLog>,
}

impl TrackingDialer<MemoryDialer> {
    /// Track an in-memory dialer.
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(MemoryDialer::new())
    }
}

impl Default for TrackingDialer<MemoryDialer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> TrackingDialer<D> {
    /// Track an arbitrary dialer.
    #[must_use]
    pub fn wrap(inner: D) -> Self {
        Self {
            inner,
            log: Arc::new(DialLog::default()),
        }
    }

    /// The shared log, usable after the dialer moves into a pool.
    #[must_use]
    pub fn log(&self) -> Arc<DialLog> {
        Arc::clone(&self.log)
    }

    /// The wrapped dialer.
    #[must_use]
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Dialer> Dialer for TrackingDialer<D> {
    type Transport = Tracked<D::Transport>;

    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send {
        let log = Arc::clone(&self.log);
        let dial = self.inner.dial(address, deadline);
        async move {
            let inner = dial.await?;
            log.dialed.fetch_add(1, Ordering::SeqCst);
            Ok(Tracked { inner, log })
        }
    }
}

/// A transport whose close is recorded in a [`DialLog`].
#[derive(Debug)]
pub struct Tracked<T> {
    inner: T,
    log: Arc<DialLog>,
}

impl<T> Tracked<T> {
    /// Unwrap the transport. The close will no longer be recorded.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: RawTransport> RawTransport for Tracked<T> {
    async fn close(&mut self) -> Result<(), TransportError> {
        let result = self.inner.close().await;
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// A transport that does nothing.
#[derive(Debug, Default)]
pub struct NullTransport;

impl RawTransport for NullTransport {
    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A dialer whose every attempt fails with a connection error.
#[derive(Debug, Clone)]
pub struct FailingDialer {
    message: String,
    attempts: Arc<AtomicUsize>,
}

impl FailingDialer {
    /// Fail every dial with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of dials attempted.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Dialer for FailingDialer {
    type Transport = NullTransport;

    fn dial(
        &self,
        _address: &Address,
        _deadline: &Deadline,
    ) -> impl Future<Output = Result<NullTransport, TransportError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Err(TransportError::connection(self.message.clone())))
    }
}

/// A dialer that waits before delegating, without looking at the deadline.
///
/// Useful for checking that the pool abandons dials on its own.
#[derive(Debug, Clone)]
pub struct SlowDialer<D> {
    inner: D,
    delay: Duration,
}

impl<D> SlowDialer<D> {
    /// Delay every dial of `inner` by `delay`.
    #[must_use]
    pub const fn new(inner: D, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<D: Dialer> Dialer for SlowDialer<D> {
    type Transport = D::Transport;

    fn dial(
        &self,
        address: &Address,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send {
        let delay = self.delay;
        let dial = self.inner.dial(address, deadline);
        async move {
            tokio::time::sleep(delay).await;
            dial.await
        }
    }
}
