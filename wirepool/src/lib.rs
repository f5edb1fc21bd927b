//! # wirepool - connection pooling for database drivers
//!
//! A bounded pool of reusable connections to a single remote endpoint, the
//! piece a driver needs between "dial a socket" and "run a command".
//!
//! ## Features
//!
//! - **Pluggable dialing** via the [`Dialer`] trait, with TCP, Unix socket
//!   and in-memory implementations
//! - **Generation invalidation**: reconnecting makes every older connection
//!   unusable, so nothing from before a disconnect is ever reused
//! - **Idempotent handles**: release or close a [`Handle`] as often as you
//!   like, only the first call counts
//! - **Deadline-aware shutdown**: [`Pool::disconnect`] drains gracefully and
//!   force-closes whatever is still out when its [`Deadline`] fires
//! - **Structured logging** through `tracing`
//!
//! ## Quick Start
//!
//! ```no_run
//! use wirepool::prelude::*;
//! use std::time::Duration;
//! use tokio::io::AsyncWriteExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PoolError> {
//!     let pool = Pool::new("127.0.0.1:27017", 16, TcpDialer::new());
//!     pool.connect().await?;
//!
//!     let handle = pool.get(&Deadline::after(Duration::from_secs(5))).await?;
//!     if let Some(mut stream) = handle.transport().await {
//!         stream.write_all(b"ping").await.map_err(TransportError::from)?;
//!     }
//!     handle.release().await?;
//!
//!     pool.disconnect(&Deadline::after(Duration::from_secs(2))).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`wirepool_core`] - Addresses, lifecycle states and error types (no async runtime)
//! - [`wirepool_transport`] - Dialers, deadlines and the pool itself

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

// Re-export all public items from core
pub use wirepool_core::*;

// Re-export transport and pool types
pub use wirepool_transport::{
    Deadline, Dialer, DialerFn, Handle, MemoryDialer, Pool, PoolConfig, PoolStats,
    PooledConnection, RawTransport, TcpDialer, TransportGuard, dialer_fn,
};

#[cfg(unix)]
pub use wirepool_transport::UnixDialer;

pub mod prelude;

/// Pool module re-exports
pub mod pool {
    //! Pool implementation types.
    pub use wirepool_transport::pool::*;
}

/// Transport module re-exports
pub mod transport {
    //! Dialers and raw transports.
    pub use wirepool_transport::*;
}

/// Logging setup re-exports
pub mod telemetry {
    //! Subscriber helpers and the event target used by the pool.
    pub use wirepool_transport::telemetry::*;
}
