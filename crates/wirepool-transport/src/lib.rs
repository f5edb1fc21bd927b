//! Dialers, cancellation signals and the connection pool.
//!
//! This crate provides everything a database client needs to keep a set of
//! reusable network connections to one remote endpoint:
//!
//! - [`Dialer`]: the pluggable capability that opens a raw connection
//! - [`Deadline`]: a cancellation signal with an optional deadline
//! - [`pool::Pool`]: the bounded pool with generation-based invalidation
//!   and deadline-aware shutdown
//! - [`pool::Handle`]: the caller-facing wrapper with idempotent release
//!
//! # Available Dialers
//!
//! | Dialer | Transport | Platform |
//! |--------|-----------|----------|
//! | [`tcp::TcpDialer`] | `tokio::net::TcpStream` | all |
//! | `unix::UnixDialer` | `tokio::net::UnixStream` | Unix only |
//! | [`memory::MemoryDialer`] | `tokio::io::DuplexStream` | all (testing) |
//! | [`DialerFn`] | anything implementing [`RawTransport`] | all |
//!
//! # Example
//!
//! ```no_run
//! use wirepool_transport::{Deadline, TcpDialer};
//! use wirepool_transport::pool::Pool;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wirepool_core::PoolError> {
//!     let pool = Pool::new("127.0.0.1:27017", 10, TcpDialer::new());
//!     pool.connect().await?;
//!
//!     let handle = pool.get(&Deadline::after(Duration::from_secs(5))).await?;
//!     // ... speak the wire protocol over handle.transport() ...
//!     handle.release().await?;
//!
//!     pool.disconnect(&Deadline::after(Duration::from_secs(1))).await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

pub mod deadline;
pub mod memory;
pub mod pool;
pub mod runtime;
pub mod tcp;
pub mod telemetry;
pub mod traits;

#[cfg(unix)]
pub mod unix;

// Re-export commonly used types
pub use deadline::Deadline;
pub use traits::{Dialer, DialerFn, RawTransport, dialer_fn};
pub use wirepool_core::{Address, ContextError, PoolError, PoolState, TransportError};

pub use memory::MemoryDialer;
pub use tcp::TcpDialer;

#[cfg(unix)]
pub use unix::UnixDialer;

// Connection pooling
pub use pool::{Handle, Pool, PoolConfig, PoolStats, PooledConnection, TransportGuard};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::deadline::Deadline;
    pub use crate::memory::MemoryDialer;
    pub use crate::pool::{Handle, Pool, PoolConfig, PoolStats, PooledConnection};
    pub use crate::tcp::TcpDialer;
    pub use crate::traits::{Dialer, DialerFn, RawTransport, dialer_fn};
    pub use wirepool_core::prelude::*;

    #[cfg(unix)]
    pub use crate::unix::UnixDialer;
}
