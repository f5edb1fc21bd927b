//! Prelude module for convenient imports.
//!
//! Import everything you need with a single use statement:
//!
//! ```rust
//! use wirepool::prelude::*;
//!
//! let config = PoolConfig::new().capacity(8);
//! let pool = Pool::with_config("127.0.0.1:27017", config, TcpDialer::new());
//! assert_eq!(pool.address().as_str(), "127.0.0.1:27017");
//! ```
//!
//! ## Included Types
//!
//! ### Core Types
//! - `Address`, `PoolState`
//! - Error types (`PoolError`, `ContextError`, `TransportError`)
//!
//! ### Pool Types
//! - `Pool`, `PoolConfig`, `PoolStats`
//! - `Handle`, `PooledConnection`
//! - `Deadline`
//!
//! ### Dialers
//! - `Dialer` and `RawTransport` traits
//! - `TcpDialer`, `UnixDialer` (Unix only), `dialer_fn`

// Core types
pub use wirepool_core::prelude::*;

// Pool and dialer types
pub use wirepool_transport::prelude::*;
