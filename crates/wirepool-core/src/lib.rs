//! # wirepool-core
//!
//! Core types shared by every wirepool crate:
//!
//! - **Error taxonomy**: [`PoolError`] with lifecycle, cancellation and transport classes
//! - **Endpoint identity**: the opaque [`Address`] a pool dials
//! - **Lifecycle state**: the [`PoolState`] machine a pool moves through
//!
//! This crate does not depend on an async runtime. Dialing, cancellation
//! signals and the pool itself live in `wirepool-transport`.
//!
//! # Example
//!
//! ```rust
//! use wirepool_core::{Address, PoolError, PoolState};
//!
//! let address = Address::new("db.internal:27017");
//! assert_eq!(address.as_str(), "db.internal:27017");
//!
//! assert!(PoolState::Disconnected.can_connect());
//! assert!(PoolError::WrongPool.is_lifecycle());
//! ```

#![deny(missing_docs)]

pub mod address;
pub mod error;
pub mod state;

pub use address::Address;
pub use error::{ContextError, PoolError, TransportError};
pub use state::PoolState;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::address::Address;
    pub use crate::error::{ContextError, PoolError, TransportError};
    pub use crate::state::PoolState;
}
