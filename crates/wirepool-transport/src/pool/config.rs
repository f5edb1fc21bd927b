//! Connection pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of idle connections retained for reuse.
pub const DEFAULT_CAPACITY: usize = 100;

/// Configuration for the connection pool.
///
/// Fixed once the pool is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Maximum number of idle connections retained for reuse.
    ///
    /// This is not a limit on checked-out connections: excess connections
    /// are closed when they are returned.
    pub capacity: usize,
    /// How long a connection may sit idle before it is considered stale.
    ///
    /// Zero disables idle expiry.
    pub idle_timeout: Duration,
    /// Maximum age of a connection before it is recycled.
    ///
    /// `None` disables lifetime limits.
    pub max_lifetime: Option<Duration>,
    /// Upper bound on connections open at once (idle, checked out, or being
    /// dialed).
    ///
    /// `None` (the default) leaves checkout unbounded; the remote endpoint's
    /// own accept limits provide the backpressure.
    pub max_open: Option<usize>,
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle-store capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the idle timeout. Zero disables idle expiry.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime.
    #[must_use]
    pub const fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Bound the number of simultaneously open connections.
    #[must_use]
    pub const fn max_open(mut self, max: Option<usize>) -> Self {
        self.max_open = max;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            idle_timeout: Duration::ZERO,
            max_lifetime: None,
            max_open: None,
        }
    }
}
